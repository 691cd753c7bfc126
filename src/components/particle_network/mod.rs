//! Animated particle-network backdrop.
//!
//! Particles drift inside the surface and every pair closer than the tier's
//! threshold is joined by a line whose opacity fades with distance. Quality is
//! chosen once per mount from a coarse device tier.

mod component;
mod error;
pub mod field;
mod host;
pub mod lifecycle;
pub mod render;
pub mod scale;
pub mod state;
pub mod tier;
pub mod types;

pub use component::ParticleNetwork;
pub use error::BackdropError;
pub use host::RESIZE_DEBOUNCE_MS;
pub use tier::{Capabilities, DeviceTier, TierConfig};
