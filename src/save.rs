//! Scene save/load as JSON.
//!
//! Only body state is persisted. Attractor relationships are rebuilt on load by
//! assigning every body its most proper attractor.

use std::fs;
use std::path::Path;

use bevy::log::info;
use bevy::math::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::Body;
use crate::simulation::{Simulation, SimulationError};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to access scene file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode or decode scene: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid scene parameters: {0}")]
    InvalidScene(#[from] SimulationError),

    #[error("invalid body '{name}': {source}")]
    InvalidBody {
        name: String,
        source: SimulationError,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Vec3Record {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<DVec3> for Vec3Record {
    fn from(value: DVec3) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }
}

impl From<Vec3Record> for DVec3 {
    fn from(value: Vec3Record) -> Self {
        DVec3::new(value.x, value.y, value.z)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BodyRecord {
    pub name: String,
    pub position: Vec3Record,
    pub velocity: Vec3Record,
    /// Whether the body asked for Keplerian motion.
    pub is_kepler_motion: bool,
    pub mass: f64,
    pub scale: f32,
}

impl From<&Body> for BodyRecord {
    fn from(body: &Body) -> Self {
        Self {
            name: body.name.clone(),
            position: body.position.into(),
            velocity: body.velocity.into(),
            is_kepler_motion: body.use_kepler_motion,
            mass: body.mass,
            scale: body.scale,
        }
    }
}

impl BodyRecord {
    pub fn to_body(&self) -> Body {
        let body = Body::new(
            self.name.clone(),
            self.mass,
            self.position.into(),
            self.velocity.into(),
        )
        .with_scale(self.scale);
        if self.is_kepler_motion {
            body.with_kepler_motion()
        } else {
            body
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub gravitational_constant: f64,
    pub time_scale: f64,
    pub bodies: Vec<BodyRecord>,
}

impl SceneDocument {
    pub fn from_simulation(simulation: &Simulation) -> Self {
        Self {
            gravitational_constant: simulation.gravitational_constant(),
            time_scale: simulation.time_scale,
            bodies: simulation.bodies().iter().map(BodyRecord::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the simulation's bodies with the ones in this document.
    ///
    /// Applies the gravitational constant and time scale, registers every
    /// body in document order, then assigns each its most proper attractor.
    /// Nothing is changed if any record is invalid.
    pub fn load_into(&self, simulation: &mut Simulation) -> Result<(), SaveError> {
        let mut scene = Simulation::default();
        scene.integrator = simulation.integrator;
        scene.keep_bodies_on_ecliptic = simulation.keep_bodies_on_ecliptic;
        scene.set_attraction_range(simulation.attraction_range().min, simulation.attraction_range().max);
        scene.set_min_attractor_mass(simulation.min_attractor_mass());
        scene.set_attractor_search_interval(simulation.attractor_search_interval());
        scene.set_ecliptic(simulation.ecliptic_normal(), simulation.ecliptic_up());
        self.populate(&mut scene)?;
        *simulation = scene;
        Ok(())
    }

    /// Build a fresh simulation with default parameters from this document.
    pub fn into_simulation(&self) -> Result<Simulation, SaveError> {
        let mut simulation = Simulation::default();
        self.populate(&mut simulation)?;
        Ok(simulation)
    }

    fn populate(&self, simulation: &mut Simulation) -> Result<(), SaveError> {
        simulation.set_gravitational_constant(self.gravitational_constant)?;
        simulation.time_scale = self.time_scale;
        for record in &self.bodies {
            simulation
                .add_body(record.to_body())
                .map_err(|source| SaveError::InvalidBody {
                    name: record.name.clone(),
                    source,
                })?;
        }
        simulation.assign_most_proper_attractors();
        Ok(())
    }
}

pub fn save_to_file(simulation: &Simulation, path: impl AsRef<Path>) -> Result<(), SaveError> {
    let path = path.as_ref();
    let json = SceneDocument::from_simulation(simulation).to_json()?;
    fs::write(path, json)?;
    info!("Saved {} bodies to {}", simulation.len(), path.display());
    Ok(())
}

/// Load a scene file into `simulation`, replacing its bodies.
pub fn load_from_file(simulation: &mut Simulation, path: impl AsRef<Path>) -> Result<(), SaveError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let document = SceneDocument::from_json(&contents)?;
    document.load_into(simulation)?;
    info!("Loaded {} bodies from {}", document.bodies.len(), path.display());
    Ok(())
}
