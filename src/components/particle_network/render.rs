//! Drawing: the [`Surface`] seam and its 2D canvas implementation.

use std::f64::consts::PI;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

use super::error::BackdropError;
use super::scale::SurfaceScale;
use super::tier::TierConfig;
use super::types::{Connection, LINE_COLOR, Particle, Rgb};

const LINE_WIDTH: f64 = 1.0;
const GLOW_RADIUS: f64 = 3.0;
const GLOW_ALPHA: f64 = 0.35;

/// Something the render loop can draw the network on.
///
/// Every call may fail, e.g. mid-resize or after the context was lost; the
/// loop counts those failures instead of propagating them.
pub trait Surface {
	/// Current logical size in CSS pixels, read fresh on every call.
	fn dimensions(&self) -> Result<(f64, f64), BackdropError>;
	/// Re-measures the surface and reapplies size and pixel ratio.
	fn restore(&mut self) -> Result<SurfaceScale, BackdropError>;
	/// Wipes the whole surface.
	fn clear(&mut self, width: f64, height: f64) -> Result<(), BackdropError>;
	/// Straight line between two points.
	fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb, alpha: f64) -> Result<(), BackdropError>;
	/// Solid disc.
	fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Rgb, alpha: f64) -> Result<(), BackdropError>;
	/// Soft halo fading out towards `radius`.
	fn fill_glow(&mut self, center: (f64, f64), radius: f64, color: Rgb, alpha: f64) -> Result<(), BackdropError>;
}

/// Draws one frame: connections first, then particles on top.
pub fn draw_frame<S: Surface + ?Sized>(
	surface: &mut S,
	particles: &[Particle],
	connections: &[Connection],
	config: &TierConfig,
	width: f64,
	height: f64,
) -> Result<(), BackdropError> {
	surface.clear(width, height)?;
	draw_connections(surface, particles, connections)?;
	draw_particles(surface, particles, config.glow)
}

fn draw_connections<S: Surface + ?Sized>(
	surface: &mut S,
	particles: &[Particle],
	connections: &[Connection],
) -> Result<(), BackdropError> {
	for c in connections {
		let (Some(a), Some(b)) = (particles.get(c.from), particles.get(c.to)) else {
			continue;
		};
		surface.stroke_line((a.x, a.y), (b.x, b.y), LINE_COLOR, c.opacity)?;
	}
	Ok(())
}

fn draw_particles<S: Surface + ?Sized>(surface: &mut S, particles: &[Particle], glow: bool) -> Result<(), BackdropError> {
	for p in particles {
		if glow {
			surface.fill_glow((p.x, p.y), p.radius * GLOW_RADIUS, p.color, p.opacity * GLOW_ALPHA)?;
		}
		surface.fill_circle((p.x, p.y), p.radius, p.color, p.opacity)?;
	}
	Ok(())
}

/// [`Surface`] backed by an HTML canvas 2D context.
pub struct CanvasSurface {
	window: Window,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	/// Grabs the canvas' 2D context; fails if the browser refuses one.
	pub fn new(window: Window, canvas: HtmlCanvasElement) -> Result<Self, BackdropError> {
		let ctx = canvas
			.get_context("2d")?
			.ok_or(BackdropError::ContextUnavailable)?
			.dyn_into::<CanvasRenderingContext2d>()
			.map_err(|_| BackdropError::ContextUnavailable)?;
		Ok(Self { window, canvas, ctx })
	}
}

impl Surface for CanvasSurface {
	fn dimensions(&self) -> Result<(f64, f64), BackdropError> {
		Ok((
			self.canvas.client_width() as f64,
			self.canvas.client_height() as f64,
		))
	}

	fn restore(&mut self) -> Result<SurfaceScale, BackdropError> {
		let (w, h) = self.dimensions()?;
		let scale = SurfaceScale::new(w, h, self.window.device_pixel_ratio());
		let (bw, bh) = scale.backing_size();
		if self.canvas.width() != bw || self.canvas.height() != bh {
			self.canvas.set_width(bw);
			self.canvas.set_height(bh);
		}
		// Resizing the backing store resets the transform, so always reapply it.
		let r = scale.pixel_ratio;
		self.ctx.set_transform(r, 0.0, 0.0, r, 0.0, 0.0)?;
		Ok(scale)
	}

	fn clear(&mut self, width: f64, height: f64) -> Result<(), BackdropError> {
		self.ctx.clear_rect(0.0, 0.0, width, height);
		Ok(())
	}

	fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb, alpha: f64) -> Result<(), BackdropError> {
		self.ctx.set_stroke_style_str(&color.rgba(alpha));
		self.ctx.set_line_width(LINE_WIDTH);
		self.ctx.begin_path();
		self.ctx.move_to(from.0, from.1);
		self.ctx.line_to(to.0, to.1);
		self.ctx.stroke();
		Ok(())
	}

	fn fill_circle(&mut self, (x, y): (f64, f64), radius: f64, color: Rgb, alpha: f64) -> Result<(), BackdropError> {
		self.ctx.begin_path();
		self.ctx.arc(x, y, radius.max(0.0), 0.0, 2.0 * PI)?;
		self.ctx.set_fill_style_str(&color.rgba(alpha));
		self.ctx.fill();
		Ok(())
	}

	fn fill_glow(&mut self, (x, y): (f64, f64), radius: f64, color: Rgb, alpha: f64) -> Result<(), BackdropError> {
		let radius = radius.max(0.0);
		let gradient = self.ctx.create_radial_gradient(x, y, 0.0, x, y, radius)?;
		gradient.add_color_stop(0.0, &color.rgba(alpha))?;
		gradient.add_color_stop(1.0, &color.rgba(0.0))?;
		self.ctx.begin_path();
		self.ctx.arc(x, y, radius, 0.0, 2.0 * PI)?;
		#[allow(deprecated)]
		self.ctx.set_fill_style(&gradient);
		self.ctx.fill();
		Ok(())
	}
}


#[cfg(test)]
mod tests {
	use super::fake::RecordingSurface;
	use super::*;
	use crate::components::particle_network::tier::DeviceTier;
	use crate::components::particle_network::types::PALETTE;

	fn particle(id: u32, x: f64) -> Particle {
		Particle {
			id,
			x,
			y: 10.0,
			vx: 0.0,
			vy: 0.0,
			radius: 2.0,
			opacity: 0.8,
			base_radius: 2.0,
			base_opacity: 0.8,
			color: PALETTE[0],
		}
	}

	#[test]
	fn frame_draws_everything_once() {
		let particles = [particle(0, 10.0), particle(1, 20.0), particle(2, 30.0)];
		let connections = [
			Connection { from: 0, to: 1, opacity: 0.3 },
			Connection { from: 1, to: 2, opacity: 0.3 },
		];
		let mut surface = RecordingSurface::sized(100.0, 100.0);
		draw_frame(&mut surface, &particles, &connections, &DeviceTier::Medium.config(), 100.0, 100.0).unwrap();
		assert_eq!(surface.clears, 1);
		assert_eq!(surface.lines, 2);
		assert_eq!(surface.circles, 3);
		assert_eq!(surface.glows, 0);
	}

	#[test]
	fn glow_only_on_glow_tiers() {
		let particles = [particle(0, 10.0)];
		let mut surface = RecordingSurface::sized(100.0, 100.0);
		draw_frame(&mut surface, &particles, &[], &DeviceTier::High.config(), 100.0, 100.0).unwrap();
		assert_eq!(surface.glows, 1);
	}

	#[test]
	fn stale_connection_indices_are_skipped() {
		let particles = [particle(0, 10.0)];
		let connections = [Connection { from: 0, to: 5, opacity: 0.3 }];
		let mut surface = RecordingSurface::sized(100.0, 100.0);
		draw_frame(&mut surface, &particles, &connections, &DeviceTier::Low.config(), 100.0, 100.0).unwrap();
		assert_eq!(surface.lines, 0);
	}

	#[test]
	fn draw_errors_propagate() {
		let mut surface = RecordingSurface {
			failing: true,
			..RecordingSurface::sized(100.0, 100.0)
		};
		let result = draw_frame(&mut surface, &[particle(0, 1.0)], &[], &DeviceTier::Low.config(), 100.0, 100.0);
		assert!(result.is_err());
	}

	#[test]
	fn rgba_formats_and_clamps() {
		assert_eq!(Rgb(34, 211, 238).rgba(0.5), "rgba(34, 211, 238, 0.5)");
		assert_eq!(Rgb(1, 2, 3).rgba(1.7), "rgba(1, 2, 3, 1)");
	}
}
