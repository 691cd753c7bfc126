use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::Function;
use log::warn;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, Window};

use super::error::BackdropError;
use super::lifecycle::{Host, HostEvent, Lifecycle};
use super::render::CanvasSurface;
use super::state::TickOutcome;

/// Quiet period after the last `resize` event before the surface is rescaled.
pub const RESIZE_DEBOUNCE_MS: i32 = 100;

/// A network mounted in the browser.
pub type Backdrop = Lifecycle<CanvasSurface, WindowHost, StdRng>;

struct Listener {
	event: HostEvent,
	target: EventTarget,
	callback: Closure<dyn FnMut(Event)>,
}

/// [`Host`] backed by `window`: animation frames, DOM listeners and the
/// resize debounce timer.
///
/// Every callback holds only a weak reference to the backdrop, so dropping the
/// backdrop frees the whole graph.
pub struct WindowHost {
	window: Window,
	animate: Closure<dyn FnMut(f64)>,
	listeners: Vec<Listener>,
	resize_timer: Rc<Cell<Option<i32>>>,
}

type FrameHandler<T> = Rc<dyn Fn(&mut T, f64)>;

/// Hands host callbacks to the backdrop through a weak reference.
///
/// A frame that arrives while the backdrop is borrowed is kept and replayed as
/// soon as the holder lets go, so the next frame still gets booked.
struct Dispatch<T> {
	target: Weak<RefCell<T>>,
	on_frame: FrameHandler<T>,
	missed_frame: Rc<Cell<Option<f64>>>,
}

impl<T> Clone for Dispatch<T> {
	fn clone(&self) -> Self {
		Self {
			target: self.target.clone(),
			on_frame: self.on_frame.clone(),
			missed_frame: self.missed_frame.clone(),
		}
	}
}

impl<T> Dispatch<T> {
	fn new(target: Weak<RefCell<T>>, on_frame: impl Fn(&mut T, f64) + 'static) -> Self {
		Self {
			target,
			on_frame: Rc::new(on_frame),
			missed_frame: Rc::new(Cell::new(None)),
		}
	}

	fn frame(&self, now: f64) {
		let on_frame = self.on_frame.clone();
		if !self.run("animation frame", |target| on_frame(target, now)) && self.target.strong_count() > 0 {
			self.missed_frame.set(Some(now));
		}
	}

	/// Returns `false` if `f` could not run.
	fn run(&self, what: &str, f: impl FnOnce(&mut T)) -> bool {
		let Some(rc) = self.target.upgrade() else {
			return false;
		};
		let Ok(mut guard) = rc.try_borrow_mut() else {
			warn!("particle network busy, {what} deferred or dropped");
			return false;
		};
		f(&mut guard);
		if let Some(now) = self.missed_frame.take() {
			(self.on_frame)(&mut guard, now);
		}
		true
	}
}

impl WindowHost {
	/// Builds every callback up front; nothing is registered until
	/// [`Host::listen`] / [`Host::request_frame`].
	pub fn new(
		window: Window,
		document: Document,
		canvas: &HtmlCanvasElement,
		backdrop: Weak<RefCell<Backdrop>>,
		on_failed: impl Fn() + 'static,
	) -> Self {
		let dispatch = Dispatch::new(backdrop, move |b: &mut Backdrop, now| {
			if b.on_animation_frame(now) == TickOutcome::Failed {
				on_failed();
			}
		});

		let animate = {
			let dispatch = dispatch.clone();
			Closure::new(move |now: f64| dispatch.frame(now))
		};

		let resize_timer = Rc::new(Cell::new(None));
		let settle: Rc<Closure<dyn FnMut()>> = {
			let (dispatch, timer) = (dispatch.clone(), resize_timer.clone());
			Rc::new(Closure::new(move || {
				timer.set(None);
				dispatch.run("resize", |b| b.on_resize());
			}))
		};
		let on_resize: Closure<dyn FnMut(Event)> = {
			let (window, timer) = (window.clone(), resize_timer.clone());
			Closure::new(move |_: Event| {
				if let Some(handle) = timer.take() {
					window.clear_timeout_with_handle(handle);
				}
				match window.set_timeout_with_callback_and_timeout_and_arguments_0(
					(*settle).as_ref().unchecked_ref(),
					RESIZE_DEBOUNCE_MS,
				) {
					Ok(handle) => timer.set(Some(handle)),
					Err(err) => warn!("particle network cannot debounce resize: {err:?}"),
				}
			})
		};

		let on_visibility: Closure<dyn FnMut(Event)> = {
			let (dispatch, document) = (dispatch.clone(), document.clone());
			Closure::new(move |_: Event| {
				let hidden = document.hidden();
				dispatch.run("visibilitychange", |b| b.on_visibility_change(hidden));
			})
		};

		let on_context_lost: Closure<dyn FnMut(Event)> = {
			let dispatch = dispatch.clone();
			Closure::new(move |event: Event| {
				// Without this the browser will not try to restore the context.
				event.prevent_default();
				dispatch.run("contextlost", |b| b.on_context_lost());
			})
		};

		let on_context_restored: Closure<dyn FnMut(Event)> = Closure::new(move |_: Event| {
			dispatch.run("contextrestored", |b| b.on_context_restored());
		});

		let window_target: EventTarget = window.clone().into();
		let canvas_target: EventTarget = canvas.clone().into();
		let listeners = vec![
			Listener {
				event: HostEvent::Resize,
				target: window_target,
				callback: on_resize,
			},
			Listener {
				event: HostEvent::Visibility,
				target: document.into(),
				callback: on_visibility,
			},
			Listener {
				event: HostEvent::ContextLost,
				target: canvas_target.clone(),
				callback: on_context_lost,
			},
			Listener {
				event: HostEvent::ContextRestored,
				target: canvas_target,
				callback: on_context_restored,
			},
		];

		Self {
			window,
			animate,
			listeners,
			resize_timer,
		}
	}

	fn listener(&self, event: HostEvent) -> Option<&Listener> {
		self.listeners.iter().find(|l| l.event == event)
	}
}

impl Host for WindowHost {
	fn request_frame(&mut self) -> Result<i32, BackdropError> {
		Ok(self
			.window
			.request_animation_frame(self.animate.as_ref().unchecked_ref::<Function>())?)
	}

	fn cancel_frame(&mut self, handle: i32) {
		if let Err(err) = self.window.cancel_animation_frame(handle) {
			warn!("particle network cannot cancel frame {handle}: {err:?}");
		}
	}

	fn listen(&mut self, event: HostEvent) -> Result<(), BackdropError> {
		let listener = self
			.listener(event)
			.ok_or_else(|| BackdropError::Js(format!("no {} handler", event.name())))?;
		listener
			.target
			.add_event_listener_with_callback(event.name(), listener.callback.as_ref().unchecked_ref())?;
		Ok(())
	}

	fn unlisten(&mut self, event: HostEvent) {
		if let Some(listener) = self.listener(event) {
			let _ = listener
				.target
				.remove_event_listener_with_callback(event.name(), listener.callback.as_ref().unchecked_ref());
		}
		if event == HostEvent::Resize {
			if let Some(handle) = self.resize_timer.take() {
				self.window.clear_timeout_with_handle(handle);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn recorder(frames: &Rc<RefCell<Vec<f64>>>) -> Dispatch<Vec<f64>> {
		Dispatch::new(Rc::downgrade(frames), |log: &mut Vec<f64>, now| log.push(now))
	}

	#[test]
	fn frame_during_borrow_is_replayed() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let dispatch = recorder(&log);
		let nested = dispatch.clone();

		assert!(dispatch.run("resize", |log| {
			nested.frame(16.0);
			log.push(-1.0);
		}));
		assert_eq!(*log.borrow(), vec![-1.0, 16.0]);

		dispatch.frame(32.0);
		assert_eq!(*log.borrow(), vec![-1.0, 16.0, 32.0]);
	}

	#[test]
	fn busy_event_reports_failure() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let dispatch = recorder(&log);
		let held = log.borrow_mut();
		assert!(!dispatch.run("visibilitychange", |log| log.push(1.0)));
		drop(held);
		assert!(log.borrow().is_empty());
	}

	#[test]
	fn gone_backdrop_is_ignored() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let dispatch = recorder(&log);
		drop(log);
		dispatch.frame(16.0);
		assert!(!dispatch.run("resize", |log| log.push(1.0)));
		assert_eq!(dispatch.missed_frame.get(), None);
	}
}
