use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use web_sys::HtmlCanvasElement;

use super::error::BackdropError;
use super::host::{Backdrop, WindowHost};
use super::lifecycle::Lifecycle;
use super::render::CanvasSurface;
use super::state::{NetworkState, STARTUP_DELAY_MS};
use super::tier::{DeviceTier, EnvironmentProbe, classify};

// The gradient doubles as the static fallback once the canvas is hidden.
const CONTAINER_STYLE: &str = "position: absolute; inset: 0; overflow: hidden; pointer-events: none; \
	background: linear-gradient(135deg, #0f172a 0%, #1e293b 50%, #0f172a 100%);";
const CANVAS_STYLE: &str = "display: block; width: 100%; height: 100%;";
const CANVAS_HIDDEN: &str = "display: none;";

/// Animated particle-network background.
///
/// Fills its positioned parent. Quality follows the detected device tier
/// unless `tier` pins one. If the canvas cannot be used, or keeps failing,
/// only the static gradient is shown.
#[component]
pub fn ParticleNetwork(
	/// Skip detection and use this tier.
	#[prop(default = None)]
	tier: Option<DeviceTier>,
	/// Delay between the first frame and the first drawn tick.
	#[prop(default = STARTUP_DELAY_MS)]
	startup_delay_ms: f64,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let failed = RwSignal::new(false);
	let backdrop = StoredValue::new_local(None::<Rc<RefCell<Backdrop>>>);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if backdrop.with_value(Option::is_some) {
			return;
		}
		match mount(canvas, tier, startup_delay_ms, failed) {
			Ok(mounted) => backdrop.set_value(Some(mounted)),
			Err(err) => {
				warn!("particle network unavailable, showing static background: {err}");
				failed.set(true);
			}
		}
	});

	on_cleanup(move || {
		// Dropping the last strong reference cancels the pending frame and
		// removes every listener.
		let _ = backdrop.try_update_value(Option::take);
	});

	view! {
		<div class="particle-network" aria-hidden="true" style=CONTAINER_STYLE>
			<canvas
				node_ref=canvas_ref
				class="particle-network-canvas"
				style=move || if failed.get() { CANVAS_HIDDEN } else { CANVAS_STYLE }
			/>
		</div>
	}
}

fn mount(
	canvas: HtmlCanvasElement,
	tier_override: Option<DeviceTier>,
	startup_delay_ms: f64,
	failed: RwSignal<bool>,
) -> Result<Rc<RefCell<Backdrop>>, BackdropError> {
	let window = web_sys::window().ok_or(BackdropError::NoWindow)?;
	let document = window.document().ok_or(BackdropError::NoWindow)?;

	let capabilities = classify(&EnvironmentProbe::detect());
	let tier = tier_override.unwrap_or(capabilities.tier);
	info!(
		"particle network tier {tier} (detected {}, accelerated: {}, small viewport: {})",
		capabilities.tier, capabilities.hardware_accelerated, capabilities.small_viewport
	);

	let surface = CanvasSurface::new(window.clone(), canvas.clone())?;
	let state = NetworkState::new(tier.config(), StdRng::from_entropy()).with_startup_delay(startup_delay_ms);

	let backdrop = Rc::new_cyclic(|weak: &Weak<RefCell<Backdrop>>| {
		let host = WindowHost::new(window, document.clone(), &canvas, weak.clone(), move || {
			let _ = failed.try_set(true);
		});
		RefCell::new(Lifecycle::new(state, surface, host))
	});
	{
		let mut mounted = backdrop.borrow_mut();
		mounted.start()?;
		// A tab opened in the background fires no visibilitychange until shown.
		mounted.on_visibility_change(document.hidden());
	}
	Ok(backdrop)
}
