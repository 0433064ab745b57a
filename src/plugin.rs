//! Bevy host integration.
//!
//! The core has no dependency on this module. It is one caller of
//! [`Simulation::tick`] among many: a game loop, an editor or a test may
//! drive the simulation directly instead.

use bevy::prelude::*;

use crate::config::SimulationConfig;
use crate::prediction::PredictionSettings;
use crate::simulation::Simulation;

/// Inserts a [`Simulation`] resource and ticks it in `FixedUpdate`.
///
/// Systems that add, remove or edit bodies should run outside
/// [`SimulationSystemSet::Step`], or be ordered before it.
#[derive(Default)]
pub struct OrbitalSimulationPlugin {
    pub config: SimulationConfig,
}

impl OrbitalSimulationPlugin {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSystemSet {
    /// The per-tick simulation step.
    Step,
}

impl Plugin for OrbitalSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Simulation::from_config(&self.config))
            .init_resource::<PredictionSettings>()
            .add_systems(FixedUpdate, step_simulation.in_set(SimulationSystemSet::Step));
    }
}

/// Advance the simulation by the fixed timestep.
fn step_simulation(mut simulation: ResMut<Simulation>, time: Res<Time>) {
    simulation.tick(time.delta_secs_f64());
}
