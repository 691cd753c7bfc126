//! Device-pixel scaling of the drawing surface.

/// Highest device pixel ratio honoured; denser screens render at 2x.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Logical size of the drawing surface and its backing-store density.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceScale {
	/// Width in CSS pixels.
	pub width: f64,
	/// Height in CSS pixels.
	pub height: f64,
	/// Backing pixels per CSS pixel, in `1.0..=MAX_PIXEL_RATIO`.
	pub pixel_ratio: f64,
}

impl SurfaceScale {
	/// Builds a scale, sanitising negative sizes and odd pixel ratios.
	pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
		let pixel_ratio = if pixel_ratio.is_finite() {
			pixel_ratio.clamp(1.0, MAX_PIXEL_RATIO)
		} else {
			1.0
		};
		Self {
			width: width.max(0.0),
			height: height.max(0.0),
			pixel_ratio,
		}
	}

	/// Nothing can be drawn on a surface without area.
	pub fn is_empty(&self) -> bool {
		self.width <= 0.0 || self.height <= 0.0
	}

	/// Backing-store size in device pixels.
	pub fn backing_size(&self) -> (u32, u32) {
		(
			(self.width * self.pixel_ratio).round() as u32,
			(self.height * self.pixel_ratio).round() as u32,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ratio_is_capped() {
		assert_eq!(SurfaceScale::new(100.0, 50.0, 3.0).pixel_ratio, 2.0);
		assert_eq!(SurfaceScale::new(100.0, 50.0, 0.5).pixel_ratio, 1.0);
		assert_eq!(SurfaceScale::new(100.0, 50.0, f64::NAN).pixel_ratio, 1.0);
	}

	#[test]
	fn backing_size_scales() {
		assert_eq!(SurfaceScale::new(801.0, 600.0, 1.5).backing_size(), (1202, 900));
		assert_eq!(SurfaceScale::new(-4.0, 10.0, 1.0).backing_size(), (0, 10));
	}

	#[test]
	fn zero_area_is_empty() {
		assert!(SurfaceScale::new(0.0, 600.0, 1.0).is_empty());
		assert!(SurfaceScale::default().is_empty());
		assert!(!SurfaceScale::new(1.0, 1.0, 1.0).is_empty());
	}
}
