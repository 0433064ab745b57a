//! Celestial - Orbital Simulation Core
//!
//! Keeps bodies on physically plausible orbits with two interchangeable
//! motion models: closed-form Keplerian propagation around a single
//! attractor, and N-body integration (Euler, Verlet or Runge-Kutta 4).
//! Orbital elements and Cartesian state can be edited live in either
//! direction.
//!
//! A [`Simulation`] is owned by the caller and advanced with
//! [`Simulation::tick`]. [`plugin::OrbitalSimulationPlugin`] wires it into a
//! bevy app.

pub mod attractor;
pub mod body;
pub mod config;
pub mod math;
pub mod orbit;
pub mod physics;
pub mod plugin;
pub mod prediction;
pub mod save;
pub mod simulation;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use body::Body;
pub use config::SimulationConfig;
pub use orbit::OrbitData;
pub use simulation::{Simulation, SimulationError};
pub use types::BodyId;
