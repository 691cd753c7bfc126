//! Ownership of the host resources a mounted network holds.
//!
//! A [`Lifecycle`] records the pending animation frame and every listener it
//! registered, and releases exactly those: when the loop fails, on explicit
//! unmount, and on drop. Releasing twice is a no-op.

use log::{debug, info, warn};
use rand::Rng;

use super::error::BackdropError;
use super::render::Surface;
use super::state::{LoopPhase, NetworkState, TickOutcome};

/// Host signals the network listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostEvent {
	/// Window resized.
	Resize,
	/// Page visibility changed.
	Visibility,
	/// Rendering context lost.
	ContextLost,
	/// Rendering context restored.
	ContextRestored,
}

impl HostEvent {
	/// Every listener a mounted network registers.
	pub const ALL: [HostEvent; 4] = [
		HostEvent::Resize,
		HostEvent::Visibility,
		HostEvent::ContextLost,
		HostEvent::ContextRestored,
	];

	/// DOM event name.
	pub fn name(self) -> &'static str {
		match self {
			HostEvent::Resize => "resize",
			HostEvent::Visibility => "visibilitychange",
			HostEvent::ContextLost => "contextlost",
			HostEvent::ContextRestored => "contextrestored",
		}
	}
}

/// Frame scheduling and event registration, as offered by the browser.
pub trait Host {
	/// Asks for one callback before the next paint.
	fn request_frame(&mut self) -> Result<i32, BackdropError>;
	/// Drops a callback requested earlier.
	fn cancel_frame(&mut self, handle: i32);
	/// Starts delivering `event`.
	fn listen(&mut self, event: HostEvent) -> Result<(), BackdropError>;
	/// Stops delivering `event`, including anything it still has pending.
	fn unlisten(&mut self, event: HostEvent);
}

/// A mounted network: loop state, drawing surface and held host resources.
pub struct Lifecycle<S: Surface, H: Host, R: Rng> {
	state: NetworkState<R>,
	surface: S,
	host: H,
	frame: Option<i32>,
	listening: Vec<HostEvent>,
}

impl<S: Surface, H: Host, R: Rng> Lifecycle<S, H, R> {
	/// Wraps a loop; nothing is acquired until [`Lifecycle::start`].
	pub fn new(state: NetworkState<R>, surface: S, host: H) -> Self {
		Self {
			state,
			surface,
			host,
			frame: None,
			listening: Vec::new(),
		}
	}

	/// Registers every listener once and requests the first frame.
	///
	/// A listener the host refuses is treated as an absent feature. Calling
	/// this again while mounted does not register anything twice.
	pub fn start(&mut self) -> Result<(), BackdropError> {
		if !self.state.phase().keeps_scheduling() {
			return Ok(());
		}
		for event in HostEvent::ALL {
			if self.listening.contains(&event) {
				continue;
			}
			match self.host.listen(event) {
				Ok(()) => self.listening.push(event),
				Err(err) => warn!("particle network cannot listen for {}: {err}", event.name()),
			}
		}
		if let Err(err) = self.schedule() {
			self.release();
			return Err(err);
		}
		info!(
			"particle network mounted: {} particles at {} fps",
			self.state.config().particle_count,
			self.state.config().target_fps
		);
		Ok(())
	}

	fn schedule(&mut self) -> Result<(), BackdropError> {
		if self.frame.is_none() {
			self.frame = Some(self.host.request_frame()?);
		}
		Ok(())
	}

	/// Runs one tick for the frame callback and books the next one.
	pub fn on_animation_frame(&mut self, now: f64) -> TickOutcome {
		self.frame = None;
		let outcome = self.state.tick(now, &mut self.surface);

		match self.state.phase() {
			LoopPhase::Failed => self.release(),
			LoopPhase::Stopped => {}
			_ => {
				if let Err(err) = self.schedule() {
					warn!("particle network cannot request a frame: {err}");
				}
			}
		}
		outcome
	}

	/// Debounced resize settled.
	pub fn on_resize(&mut self) {
		self.state.resized(&mut self.surface);
	}

	/// Page hidden or shown.
	pub fn on_visibility_change(&mut self, hidden: bool) {
		self.state.set_hidden(hidden);
	}

	/// Rendering context lost.
	pub fn on_context_lost(&mut self) {
		self.state.context_lost();
	}

	/// Rendering context restored.
	pub fn on_context_restored(&mut self) {
		self.state.context_restored(&mut self.surface);
	}

	/// Stops the loop and releases whatever is still held.
	pub fn unmount(&mut self) {
		self.state.stop();
		self.release();
	}

	fn release(&mut self) {
		if let Some(handle) = self.frame.take() {
			self.host.cancel_frame(handle);
		}
		if !self.listening.is_empty() {
			debug!("particle network releasing {} listeners", self.listening.len());
		}
		for event in self.listening.drain(..) {
			self.host.unlisten(event);
		}
	}

	/// Phase of the underlying loop.
	pub fn phase(&self) -> LoopPhase {
		self.state.phase()
	}

	/// The underlying loop.
	pub fn state(&self) -> &NetworkState<R> {
		&self.state
	}

	#[cfg(test)]
	pub(super) fn host(&self) -> &H {
		&self.host
	}

	#[cfg(test)]
	pub(super) fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}
}

impl<S: Surface, H: Host, R: Rng> Drop for Lifecycle<S, H, R> {
	fn drop(&mut self) {
		self.unmount();
	}
}
