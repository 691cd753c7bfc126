//! Particle physics and the proximity graph.

use rand::Rng;

use super::types::{Connection, PALETTE, Particle};

const SPEED: f64 = 0.25;
const RADIUS_RANGE: (f64, f64) = (2.0, 4.0);
const OPACITY_RANGE: (f64, f64) = (0.55, 0.9);

const PULSE_SPEED: f64 = 2.0;
const PULSE_PHASE_STEP: f64 = 0.5;
const RADIUS_PULSE: f64 = 0.2;
const OPACITY_PULSE: f64 = 0.15;

/// Spawns `count` particles uniformly inside a `width` x `height` surface.
pub fn initialize<R: Rng>(rng: &mut R, count: usize, width: f64, height: f64) -> Vec<Particle> {
	(0..count)
		.map(|i| {
			let radius = rng.gen_range(RADIUS_RANGE.0..RADIUS_RANGE.1);
			let opacity = rng.gen_range(OPACITY_RANGE.0..OPACITY_RANGE.1);
			Particle {
				id: i as u32,
				x: sample(rng, width),
				y: sample(rng, height),
				vx: rng.gen_range(-SPEED..=SPEED),
				vy: rng.gen_range(-SPEED..=SPEED),
				radius,
				opacity,
				base_radius: radius,
				base_opacity: opacity,
				color: PALETTE[rng.gen_range(0..PALETTE.len())],
			}
		})
		.collect()
}

// gen_range panics on an empty range, which a zero-size surface would produce.
fn sample<R: Rng>(rng: &mut R, extent: f64) -> f64 {
	if extent > 0.0 { rng.gen_range(0.0..extent) } else { 0.0 }
}

/// Moves every particle one tick, reflecting off the surface edges.
///
/// With `animate` set, radius and opacity pulse around their spawn values as a
/// function of `elapsed` seconds, offset by particle id.
pub fn advance(particles: &mut [Particle], width: f64, height: f64, elapsed: f64, animate: bool) {
	for p in particles.iter_mut() {
		p.x += p.vx;
		p.y += p.vy;
		(p.x, p.vx) = reflect(p.x, p.vx, width);
		(p.y, p.vy) = reflect(p.y, p.vy, height);

		if animate {
			let wave = (elapsed * PULSE_SPEED + p.id as f64 * PULSE_PHASE_STEP).sin();
			p.radius = p.base_radius * (1.0 + RADIUS_PULSE * wave);
			p.opacity = (p.base_opacity * (1.0 - OPACITY_PULSE + OPACITY_PULSE * wave)).clamp(0.0, 1.0);
		}
	}
}

fn reflect(pos: f64, vel: f64, extent: f64) -> (f64, f64) {
	let extent = extent.max(0.0);
	if pos < 0.0 {
		(0.0, vel.abs())
	} else if pos > extent {
		(extent, -vel.abs())
	} else {
		(pos, vel)
	}
}

/// Pulls particles left outside a shrunken surface back onto its edge.
pub fn clamp_into(particles: &mut [Particle], width: f64, height: f64) {
	for p in particles.iter_mut() {
		p.x = p.x.clamp(0.0, width.max(0.0));
		p.y = p.y.clamp(0.0, height.max(0.0));
	}
}

/// Connects every unordered pair closer than `max_distance`.
///
/// Pairs are rejected on squared distance; the root is only taken for pairs
/// that survive.
pub fn compute_connections(particles: &[Particle], max_distance: f64, line_opacity: f64) -> Vec<Connection> {
	let max_sq = max_distance * max_distance;
	let mut connections = Vec::new();

	for (i, a) in particles.iter().enumerate() {
		for (j, b) in particles.iter().enumerate().skip(i + 1) {
			let (dx, dy) = (a.x - b.x, a.y - b.y);
			let dist_sq = dx * dx + dy * dy;
			if dist_sq >= max_sq {
				continue;
			}
			let dist = dist_sq.sqrt();
			connections.push(Connection {
				from: i,
				to: j,
				opacity: (1.0 - dist / max_distance) * line_opacity,
			});
		}
	}
	connections
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::components::particle_network::types::Rgb;
	use proptest::prelude::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn at(id: u32, x: f64, y: f64, vx: f64, vy: f64) -> Particle {
		Particle {
			id,
			x,
			y,
			vx,
			vy,
			radius: 3.0,
			opacity: 0.7,
			base_radius: 3.0,
			base_opacity: 0.7,
			color: Rgb(255, 255, 255),
		}
	}

	#[test]
	fn initialize_respects_ranges() {
		let mut rng = StdRng::seed_from_u64(7);
		let particles = initialize(&mut rng, 500, 320.0, 200.0);
		assert_eq!(particles.len(), 500);
		for (i, p) in particles.iter().enumerate() {
			assert_eq!(p.id, i as u32);
			assert!((0.0..=320.0).contains(&p.x));
			assert!((0.0..=200.0).contains(&p.y));
			assert!(p.vx.abs() <= SPEED && p.vy.abs() <= SPEED);
			assert!((2.0..4.0).contains(&p.radius));
			assert!((0.55..0.9).contains(&p.opacity));
			assert!(PALETTE.contains(&p.color));
		}
	}

	#[test]
	fn initialize_on_empty_surface() {
		let mut rng = StdRng::seed_from_u64(1);
		let particles = initialize(&mut rng, 3, 0.0, 0.0);
		assert!(particles.iter().all(|p| p.x == 0.0 && p.y == 0.0));
	}

	#[test]
	fn advance_moves_then_reflects() {
		let mut particles = vec![at(0, 5.0, 50.0, -0.3, 0.0)];
		advance(&mut particles, 200.0, 100.0, 0.0, false);
		assert!((particles[0].x - 4.7).abs() < 1e-9);
		assert_eq!(particles[0].vx, -0.3);

		let mut ticks = 0;
		while particles[0].vx < 0.0 {
			advance(&mut particles, 200.0, 100.0, 0.0, false);
			ticks += 1;
			assert!(ticks < 100);
		}
		assert_eq!(particles[0].x, 0.0);
		assert_eq!(particles[0].vx, 0.3);
	}

	#[test]
	fn advance_reflects_far_edge() {
		let mut particles = vec![at(0, 199.9, 99.9, 0.25, 0.25)];
		advance(&mut particles, 200.0, 100.0, 0.0, false);
		assert_eq!((particles[0].x, particles[0].y), (200.0, 100.0));
		assert_eq!((particles[0].vx, particles[0].vy), (-0.25, -0.25));
	}

	#[test]
	fn pulse_is_bounded_and_out_of_phase() {
		let mut particles = vec![at(0, 10.0, 10.0, 0.0, 0.0), at(1, 20.0, 20.0, 0.0, 0.0)];
		for step in 0..200 {
			advance(&mut particles, 100.0, 100.0, step as f64 * 0.05, true);
			for p in &particles {
				assert!(p.radius >= 3.0 * (1.0 - RADIUS_PULSE) - 1e-9);
				assert!(p.radius <= 3.0 * (1.0 + RADIUS_PULSE) + 1e-9);
				assert!((0.0..=1.0).contains(&p.opacity));
			}
		}
		assert_ne!(particles[0].radius, particles[1].radius);
	}

	#[test]
	fn static_tier_keeps_base_look() {
		let mut particles = vec![at(0, 10.0, 10.0, 0.1, 0.1)];
		advance(&mut particles, 100.0, 100.0, 12.5, false);
		assert_eq!(particles[0].radius, 3.0);
		assert_eq!(particles[0].opacity, 0.7);
	}

	#[test]
	fn clamp_after_shrink() {
		let mut particles = vec![at(0, 300.0, 40.0, 0.2, 0.2), at(1, 50.0, 250.0, 0.2, 0.2)];
		clamp_into(&mut particles, 100.0, 100.0);
		assert_eq!((particles[0].x, particles[0].y), (100.0, 40.0));
		assert_eq!((particles[1].x, particles[1].y), (50.0, 100.0));
	}

	#[test]
	fn two_particle_scenario() {
		let particles = vec![at(0, 0.0, 0.0, 0.0, 0.0), at(1, 100.0, 0.0, 0.0, 0.0)];
		let connections = compute_connections(&particles, 150.0, 0.55);
		assert_eq!(connections.len(), 1);
		assert_eq!((connections[0].from, connections[0].to), (0, 1));
		assert!((connections[0].opacity - (1.0 - 100.0 / 150.0) * 0.55).abs() < 1e-12);

		assert!(compute_connections(&particles, 50.0, 0.55).is_empty());
	}

	#[test]
	fn pair_exactly_at_threshold_is_dropped() {
		let particles = vec![at(0, 0.0, 0.0, 0.0, 0.0), at(1, 150.0, 0.0, 0.0, 0.0)];
		assert!(compute_connections(&particles, 150.0, 0.4).is_empty());
	}

	fn field() -> impl Strategy<Value = Vec<Particle>> {
		prop::collection::vec((0.0f64..400.0, 0.0f64..300.0, -0.3f64..0.3, -0.3f64..0.3), 0..40).prop_map(
			|raw| {
				raw.into_iter()
					.enumerate()
					.map(|(i, (x, y, vx, vy))| at(i as u32, x, y, vx, vy))
					.collect()
			},
		)
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(100))]

		#[test]
		fn particles_stay_on_surface(mut particles in field(), ticks in 1usize..400, animate in any::<bool>()) {
			for t in 0..ticks {
				advance(&mut particles, 400.0, 300.0, t as f64 / 60.0, animate);
				for p in &particles {
					prop_assert!((0.0..=400.0).contains(&p.x));
					prop_assert!((0.0..=300.0).contains(&p.y));
				}
			}
		}

		#[test]
		fn connections_are_valid(particles in field(), max in 1.0f64..300.0) {
			let connections = compute_connections(&particles, max, 0.5);
			let mut seen = HashSet::new();
			for c in &connections {
				prop_assert!(c.from < c.to);
				prop_assert!(seen.insert((c.from, c.to)));
				let (a, b) = (&particles[c.from], &particles[c.to]);
				prop_assert!(((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt() < max);
				prop_assert!((0.0..=0.5).contains(&c.opacity));
			}
		}

		#[test]
		fn connections_are_idempotent(particles in field(), max in 1.0f64..300.0) {
			prop_assert_eq!(
				compute_connections(&particles, max, 0.4),
				compute_connections(&particles, max, 0.4)
			);
		}
	}
}
