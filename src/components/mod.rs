//! Reusable view components.

pub mod particle_network;
