//! Device capability detection and the per-tier quality table.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

/// Viewports at or below this width are treated as phones.
pub const SMALL_VIEWPORT_WIDTH: f64 = 768.0;

/// Assumed core count when the browser does not report one.
const FALLBACK_CORE_COUNT: u32 = 4;

const MOBILE_AGENTS: &[&str] = &[
	"android",
	"webos",
	"iphone",
	"ipad",
	"ipod",
	"blackberry",
	"iemobile",
	"opera mini",
	"mobile",
];

/// Coarse performance class of the host, fixed for a component's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceTier {
	/// Phones, weak CPUs, no GPU: fewest nodes, no effects.
	Low,
	/// Mid-range desktops.
	Medium,
	/// Everything else: all effects on.
	High,
}

/// Adaptive parameters for one tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierConfig {
	/// Number of particles spawned at start.
	pub particle_count: usize,
	/// Pairs closer than this (px) are connected.
	pub max_distance: f64,
	/// Upper bound on fully rendered ticks per second.
	pub target_fps: u32,
	/// Pulse particle radius and opacity over time.
	pub animate_nodes: bool,
	/// Draw a soft radial glow under every particle.
	pub glow: bool,
	/// Multiplier applied to every connection opacity, in [0, 1].
	pub line_opacity: f64,
	/// Rendered ticks between two proximity recomputations.
	pub connection_refresh_ticks: u32,
}

const TIER_TABLE: [TierConfig; 3] = [
	TierConfig {
		particle_count: 25,
		max_distance: 150.0,
		target_fps: 30,
		animate_nodes: false,
		glow: false,
		line_opacity: 0.40,
		connection_refresh_ticks: 30,
	},
	TierConfig {
		particle_count: 50,
		max_distance: 200.0,
		target_fps: 45,
		animate_nodes: true,
		glow: false,
		line_opacity: 0.50,
		connection_refresh_ticks: 20,
	},
	TierConfig {
		particle_count: 80,
		max_distance: 250.0,
		target_fps: 60,
		animate_nodes: true,
		glow: true,
		line_opacity: 0.55,
		connection_refresh_ticks: 15,
	},
];

impl TierConfig {
	/// Minimum time between two rendered ticks.
	pub fn frame_interval_ms(&self) -> f64 {
		1000.0 / self.target_fps.max(1) as f64
	}
}

impl DeviceTier {
	/// Every tier, cheapest first.
	pub const ALL: [DeviceTier; 3] = [DeviceTier::Low, DeviceTier::Medium, DeviceTier::High];

	/// Looks up this tier's row in the quality table.
	pub fn config(self) -> TierConfig {
		TIER_TABLE[self as usize]
	}

	/// Lowercase name, as accepted by [`FromStr`].
	pub fn as_str(self) -> &'static str {
		match self {
			DeviceTier::Low => "low",
			DeviceTier::Medium => "medium",
			DeviceTier::High => "high",
		}
	}
}

impl fmt::Display for DeviceTier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Returned when a string names no tier.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown device tier `{0}`")]
pub struct UnknownTier(pub String);

impl FromStr for DeviceTier {
	type Err = UnknownTier;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"low" => Ok(DeviceTier::Low),
			"medium" => Ok(DeviceTier::Medium),
			"high" => Ok(DeviceTier::High),
			_ => Err(UnknownTier(s.to_owned())),
		}
	}
}

/// Raw environment facts the classifier decides on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvironmentProbe {
	/// `window.innerWidth`, `None` outside a browser.
	pub viewport_width: Option<f64>,
	/// `navigator.userAgent`, `None` outside a browser.
	pub user_agent: Option<String>,
	/// `navigator.hardwareConcurrency`, `None` when unreported.
	pub core_count: Option<u32>,
	/// Whether a throwaway canvas handed out a WebGL context.
	pub has_acceleration: bool,
}

/// Result of classifying an [`EnvironmentProbe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
	/// Selected tier.
	pub tier: DeviceTier,
	/// An accelerated graphics context was obtainable.
	pub hardware_accelerated: bool,
	/// The viewport is phone-sized.
	pub small_viewport: bool,
}

impl EnvironmentProbe {
	/// Reads the current browser environment. Anything that cannot be read is
	/// reported as absent.
	pub fn detect() -> Self {
		let Some(window) = web_sys::window() else {
			return Self::default();
		};
		let navigator = window.navigator();
		let core_count = navigator.hardware_concurrency();

		Self {
			viewport_width: window.inner_width().ok().and_then(|w| w.as_f64()),
			user_agent: navigator.user_agent().ok(),
			core_count: (core_count >= 1.0).then_some(core_count as u32),
			has_acceleration: probe_acceleration(&window),
		}
	}
}

fn probe_acceleration(window: &web_sys::Window) -> bool {
	let Some(canvas) = window
		.document()
		.and_then(|doc| doc.create_element("canvas").ok())
		.and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
	else {
		return false;
	};
	["webgl", "experimental-webgl"]
		.iter()
		.any(|kind| matches!(canvas.get_context(kind), Ok(Some(_))))
}

/// Case-insensitive match against known phone/tablet user agents.
pub fn is_mobile_agent(user_agent: &str) -> bool {
	let agent = user_agent.to_ascii_lowercase();
	MOBILE_AGENTS.iter().any(|pattern| agent.contains(pattern))
}

/// Maps probed facts to a tier. Pure: equal probes give equal answers.
pub fn classify(probe: &EnvironmentProbe) -> Capabilities {
	let (Some(viewport_width), Some(user_agent)) = (probe.viewport_width, &probe.user_agent) else {
		return Capabilities {
			tier: DeviceTier::Low,
			hardware_accelerated: false,
			small_viewport: false,
		};
	};

	let small_viewport = viewport_width <= SMALL_VIEWPORT_WIDTH;
	let cores = probe.core_count.unwrap_or(FALLBACK_CORE_COUNT);

	let tier = if small_viewport || is_mobile_agent(user_agent) || cores <= 2 || !probe.has_acceleration
	{
		DeviceTier::Low
	} else if cores <= 4 {
		DeviceTier::Medium
	} else {
		DeviceTier::High
	};

	Capabilities {
		tier,
		hardware_accelerated: probe.has_acceleration,
		small_viewport,
	}
}
