//! The per-frame loop state machine.

use log::{debug, error, warn};
use rand::Rng;

use super::error::BackdropError;
use super::field;
use super::render::{Surface, draw_frame};
use super::tier::TierConfig;
use super::types::{Connection, Particle};

/// Consecutive failed ticks tolerated; one more and the loop gives up.
pub const ERROR_THRESHOLD: u32 = 10;

/// Settling time between the first frame and the first drawn tick.
pub const STARTUP_DELAY_MS: f64 = 100.0;

/// Where the render loop is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopPhase {
	/// Waiting for the startup delay and a non-empty surface.
	Starting,
	/// Simulating and drawing.
	Running,
	/// Page hidden; frames keep coming but do nothing.
	Suspended,
	/// Rendering context lost; waiting for it to come back.
	Degraded,
	/// Too many consecutive errors. Terminal.
	Failed,
	/// Unmounted. Terminal.
	Stopped,
}

impl LoopPhase {
	/// Whether another animation frame should be requested after a tick.
	pub fn keeps_scheduling(self) -> bool {
		!matches!(self, LoopPhase::Failed | LoopPhase::Stopped)
	}
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
	/// Still starting up.
	Waiting,
	/// Particles spawned; the loop is now live.
	Started,
	/// Too soon after the previous tick.
	Throttled,
	/// Suspended, degraded, or the surface has no area.
	Idle,
	/// Physics advanced and a frame was drawn.
	Rendered,
	/// The tick failed and was counted.
	Errored,
	/// The loop has given up.
	Failed,
	/// The loop was stopped.
	Stopped,
}

/// Flags that gate drawing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceStatus {
	/// The page is in the background.
	pub hidden: bool,
	/// The browser dropped the rendering context.
	pub context_lost: bool,
	/// A tick failed; the surface is restored before the next draw.
	pub suspect: bool,
	/// Failed ticks since the last good one.
	pub consecutive_errors: u32,
}

/// Counters over the loop's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
	/// Animation frames received.
	pub frames: u64,
	/// Ticks that advanced physics and drew.
	pub rendered: u64,
	/// Proximity graph recomputations.
	pub connection_passes: u64,
	/// Failed ticks.
	pub errors: u64,
}

/// The particle network and the state machine driving it.
pub struct NetworkState<R> {
	config: TierConfig,
	phase: LoopPhase,
	status: SurfaceStatus,
	particles: Vec<Particle>,
	connections: Vec<Connection>,
	refresh_counter: u32,
	first_frame: Option<f64>,
	last_tick: Option<f64>,
	startup_delay: f64,
	stats: LoopStats,
	rng: R,
}

impl<R: Rng> NetworkState<R> {
	/// A loop in [`LoopPhase::Starting`] for the given tier settings.
	pub fn new(config: TierConfig, rng: R) -> Self {
		Self {
			config,
			phase: LoopPhase::Starting,
			status: SurfaceStatus::default(),
			particles: Vec::new(),
			connections: Vec::new(),
			refresh_counter: 0,
			first_frame: None,
			last_tick: None,
			startup_delay: STARTUP_DELAY_MS,
			stats: LoopStats::default(),
			rng,
		}
	}

	/// Overrides [`STARTUP_DELAY_MS`].
	pub fn with_startup_delay(mut self, delay_ms: f64) -> Self {
		self.startup_delay = delay_ms.max(0.0);
		self
	}

	/// Current phase.
	pub fn phase(&self) -> LoopPhase {
		self.phase
	}

	/// Tier settings this loop was built with.
	pub fn config(&self) -> &TierConfig {
		&self.config
	}

	/// Flags currently gating drawing.
	pub fn status(&self) -> &SurfaceStatus {
		&self.status
	}

	/// Lifetime counters.
	pub fn stats(&self) -> LoopStats {
		self.stats
	}

	/// Live particles; empty before start and after Failed or Stopped.
	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	/// Proximity graph from the last recomputation.
	pub fn connections(&self) -> &[Connection] {
		&self.connections
	}

	/// Handles one animation frame at `now` milliseconds.
	pub fn tick<S: Surface + ?Sized>(&mut self, now: f64, surface: &mut S) -> TickOutcome {
		self.stats.frames += 1;
		match self.phase {
			LoopPhase::Stopped => TickOutcome::Stopped,
			LoopPhase::Failed => TickOutcome::Failed,
			LoopPhase::Suspended | LoopPhase::Degraded => TickOutcome::Idle,
			LoopPhase::Starting => self.try_start(now, surface),
			LoopPhase::Running => self.run(now, surface),
		}
	}

	fn try_start<S: Surface + ?Sized>(&mut self, now: f64, surface: &mut S) -> TickOutcome {
		let first = *self.first_frame.get_or_insert(now);
		if now - first < self.startup_delay {
			return TickOutcome::Waiting;
		}
		let scale = match surface.restore() {
			Ok(scale) => scale,
			Err(err) => return self.record_error(err),
		};
		if scale.is_empty() {
			return TickOutcome::Waiting;
		}

		self.particles = field::initialize(&mut self.rng, self.config.particle_count, scale.width, scale.height);
		self.refresh_connections();
		self.last_tick = None;
		self.status.consecutive_errors = 0;
		self.status.suspect = false;
		self.phase = LoopPhase::Running;
		debug!(
			"particle network running on {}x{}: {} particles, {} connections",
			scale.width,
			scale.height,
			self.particles.len(),
			self.connections.len()
		);
		self.settle();
		TickOutcome::Started
	}

	fn run<S: Surface + ?Sized>(&mut self, now: f64, surface: &mut S) -> TickOutcome {
		let interval = self.config.frame_interval_ms();
		match self.last_tick {
			Some(last) => {
				let elapsed = now - last;
				if elapsed < interval {
					return TickOutcome::Throttled;
				}
				// Keep the remainder so the long-run rate matches the target.
				self.last_tick = Some(now - elapsed % interval);
			}
			None => self.last_tick = Some(now),
		}

		match self.step(now, surface) {
			Ok(drawn) => {
				self.status.consecutive_errors = 0;
				if drawn {
					self.stats.rendered += 1;
					TickOutcome::Rendered
				} else {
					TickOutcome::Idle
				}
			}
			Err(err) => self.record_error(err),
		}
	}

	fn step<S: Surface + ?Sized>(&mut self, now: f64, surface: &mut S) -> Result<bool, BackdropError> {
		if self.status.suspect {
			surface.restore()?;
			self.status.suspect = false;
		}
		let (width, height) = surface.dimensions()?;
		if width <= 0.0 || height <= 0.0 {
			return Ok(false);
		}

		let elapsed = (now - self.first_frame.unwrap_or(now)) / 1000.0;
		field::advance(&mut self.particles, width, height, elapsed, self.config.animate_nodes);

		self.refresh_counter += 1;
		if self.refresh_counter >= self.config.connection_refresh_ticks {
			self.refresh_connections();
		}

		draw_frame(surface, &self.particles, &self.connections, &self.config, width, height)?;
		Ok(true)
	}

	fn refresh_connections(&mut self) {
		self.connections =
			field::compute_connections(&self.particles, self.config.max_distance, self.config.line_opacity);
		self.refresh_counter = 0;
		self.stats.connection_passes += 1;
	}

	fn record_error(&mut self, err: BackdropError) -> TickOutcome {
		self.stats.errors += 1;
		self.status.consecutive_errors += 1;
		self.status.suspect = true;

		if self.status.consecutive_errors > ERROR_THRESHOLD {
			error!(
				"particle network failed after {} consecutive errors, last: {err}",
				self.status.consecutive_errors
			);
			self.phase = LoopPhase::Failed;
			self.particles.clear();
			self.connections.clear();
			return TickOutcome::Failed;
		}
		warn!(
			"particle network tick failed ({}/{ERROR_THRESHOLD}): {err}",
			self.status.consecutive_errors
		);
		TickOutcome::Errored
	}

	/// Page visibility changed.
	pub fn set_hidden(&mut self, hidden: bool) {
		self.status.hidden = hidden;
		self.settle();
	}

	/// The browser dropped the rendering context.
	pub fn context_lost(&mut self) {
		self.status.context_lost = true;
		self.settle();
	}

	/// The rendering context is back; size and pixel ratio are reapplied.
	pub fn context_restored<S: Surface + ?Sized>(&mut self, surface: &mut S) {
		self.status.context_lost = false;
		if !self.phase.keeps_scheduling() {
			return;
		}
		match surface.restore() {
			Ok(_) => self.status.suspect = false,
			Err(err) => {
				warn!("particle network could not restore its surface: {err}");
				self.status.suspect = true;
			}
		}
		self.settle();
	}

	/// The container settled on a new size.
	pub fn resized<S: Surface + ?Sized>(&mut self, surface: &mut S) {
		if !self.phase.keeps_scheduling() {
			return;
		}
		match surface.restore() {
			Ok(scale) => {
				field::clamp_into(&mut self.particles, scale.width, scale.height);
				debug!(
					"particle network resized to {}x{} @{}x",
					scale.width, scale.height, scale.pixel_ratio
				);
			}
			Err(err) => {
				warn!("particle network resize failed: {err}");
				self.status.suspect = true;
			}
		}
	}

	/// Unmount: drops the model; every later tick is a no-op.
	pub fn stop(&mut self) {
		if self.phase != LoopPhase::Stopped {
			debug!("particle network {:?} -> Stopped", self.phase);
			self.phase = LoopPhase::Stopped;
			self.particles.clear();
			self.connections.clear();
		}
	}

	fn settle(&mut self) {
		let next = match self.phase {
			LoopPhase::Starting | LoopPhase::Failed | LoopPhase::Stopped => return,
			_ if self.status.context_lost => LoopPhase::Degraded,
			_ if self.status.hidden => LoopPhase::Suspended,
			_ => LoopPhase::Running,
		};
		if next != self.phase {
			debug!("particle network {:?} -> {:?}", self.phase, next);
			if next == LoopPhase::Running {
				self.last_tick = None;
			}
			self.phase = next;
		}
	}
}
