//! Trajectory prediction.
//!
//! Runs a throw-away N-body Euler integration of every active body so a
//! presentation layer can draw where the scene is heading. The simulation
//! itself is never touched.

use bevy::math::DVec3;
use bevy::prelude::Resource;

use crate::physics::{compute_acceleration_from_sources, AttractionRange, AttractorSource};
use crate::simulation::Simulation;
use crate::types::BodyId;

/// Bodies closer than this do not pull each other during prediction.
pub const PREDICTION_MIN_ATTRACTION_RANGE: f64 = 0.5;

/// Configuration for trajectory prediction.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct PredictionSettings {
    /// Integration step in simulation seconds.
    ///
    /// Larger steps reach further with fewer points at the cost of precision.
    pub calc_step: f64,
    /// Number of integration steps, one recorded point each.
    pub points_count: usize,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            calc_step: 1.0,
            points_count: 50,
        }
    }
}

/// Predicted path of one body.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictedTrajectory {
    pub body: BodyId,
    /// Position before each step, followed by the final position.
    pub points: Vec<DVec3>,
}

impl PredictedTrajectory {
    pub fn final_position(&self) -> Option<DVec3> {
        self.points.last().copied()
    }
}

#[derive(Clone, Copy)]
struct Particle {
    id: BodyId,
    position: DVec3,
    velocity: DVec3,
    mg: f64,
    is_fixed: bool,
}

/// Predict the paths of every active body.
///
/// Every active body attracts every other, regardless of the attractor-mass
/// threshold; fixed bodies stay put. Velocities for a step are all updated
/// before any body moves.
pub fn predict_trajectories(simulation: &Simulation, settings: &PredictionSettings) -> Vec<PredictedTrajectory> {
    let g = simulation.gravitational_constant();
    let mut particles: Vec<Particle> = simulation
        .bodies()
        .iter()
        .filter(|body| body.is_active)
        .map(|body| Particle {
            id: body.id(),
            position: body.position,
            velocity: body.velocity + body.additional_velocity,
            mg: body.mg(g),
            is_fixed: body.is_fixed_position,
        })
        .collect();
    let mut trajectories: Vec<PredictedTrajectory> = particles
        .iter()
        .map(|particle| PredictedTrajectory {
            body: particle.id,
            points: Vec::with_capacity(settings.points_count + 1),
        })
        .collect();
    if !(settings.calc_step.is_finite() && settings.calc_step > 0.0) {
        return trajectories;
    }

    let range = AttractionRange {
        min: PREDICTION_MIN_ATTRACTION_RANGE,
        max: simulation.attraction_range().max,
    };
    let mut sources: Vec<AttractorSource> = Vec::with_capacity(particles.len());
    for _ in 0..settings.points_count {
        sources.clear();
        sources.extend(particles.iter().map(|particle| AttractorSource {
            id: particle.id,
            position: particle.position,
            mg: particle.mg,
            max_range: f64::INFINITY,
        }));

        for particle in particles.iter_mut().filter(|p| !p.is_fixed) {
            let acc = compute_acceleration_from_sources(particle.position, Some(particle.id), &sources, &range);
            particle.velocity += acc * settings.calc_step;
            if !particle.velocity.is_finite() {
                particle.velocity = DVec3::ZERO;
            }
        }
        for (particle, trajectory) in particles.iter_mut().zip(&mut trajectories) {
            trajectory.points.push(particle.position);
            if !particle.is_fixed {
                particle.position += particle.velocity * settings.calc_step;
            }
        }
    }
    for (particle, trajectory) in particles.iter().zip(&mut trajectories) {
        trajectory.points.push(particle.position);
    }
    trajectories
}
