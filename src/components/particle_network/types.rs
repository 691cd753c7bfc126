//! Plain data shared by the field model and the renderer.

/// An opaque sRGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
	/// CSS `rgba()` string at the given alpha.
	pub fn rgba(self, alpha: f64) -> String {
		format!("rgba({}, {}, {}, {})", self.0, self.1, self.2, alpha.clamp(0.0, 1.0))
	}
}

/// Particle colours: cyan, blue, sky, indigo.
pub const PALETTE: [Rgb; 4] = [
	Rgb(34, 211, 238),
	Rgb(59, 130, 246),
	Rgb(56, 189, 248),
	Rgb(129, 140, 248),
];

/// Stroke colour for connection lines.
pub const LINE_COLOR: Rgb = Rgb(34, 211, 238);

/// One moving point of the network.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	/// Stable index-like identity, also used as the pulse phase offset.
	pub id: u32,
	/// Surface-local x, CSS pixels.
	pub x: f64,
	/// Surface-local y, CSS pixels.
	pub y: f64,
	/// Horizontal velocity, pixels per tick.
	pub vx: f64,
	/// Vertical velocity, pixels per tick.
	pub vy: f64,
	/// Current drawn radius.
	pub radius: f64,
	/// Current drawn opacity, in [0, 1].
	pub opacity: f64,
	/// Spawn radius the pulse oscillates around.
	pub base_radius: f64,
	/// Spawn opacity the pulse oscillates around.
	pub base_opacity: f64,
	/// Fill colour.
	pub color: Rgb,
}

/// Edge between two particles that are currently close to each other.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connection {
	/// Index of the first endpoint; always less than `to`.
	pub from: usize,
	/// Index of the second endpoint.
	pub to: usize,
	/// Line opacity, fixed until the next recomputation.
	pub opacity: f64,
}
