//! Heuristics for picking a body's gravitational parent.
//!
//! Every heuristic skips the target itself, inactive bodies, and bodies
//! lighter than the attractor-mass threshold. Ties keep the candidate seen
//! first, so results follow registration order.

use bevy::math::DVec3;

use crate::body::Body;
use crate::physics::{relative_perturbation_ratio, AttractionRange, AttractorSource};
use crate::types::BodyId;

/// Simulation-wide parameters the heuristics depend on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionParams {
    pub gravitational_constant: f64,
    pub min_attractor_mass: f64,
    pub range: AttractionRange,
}

/// Which heuristic to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttractorStrategy {
    Nearest,
    Biggest,
    MostProper,
}

impl AttractorStrategy {
    pub fn select<'a>(
        self,
        target: &Body,
        candidates: impl IntoIterator<Item = &'a Body>,
        params: &SelectionParams,
    ) -> Option<BodyId> {
        match self {
            Self::Nearest => nearest(target, candidates, params),
            Self::Biggest => biggest(target, candidates, params),
            Self::MostProper => most_proper(target, candidates, params),
        }
    }
}

fn is_eligible(target: &Body, candidate: &Body, params: &SelectionParams) -> bool {
    candidate.id() != target.id()
        && candidate.is_active
        && candidate.mass >= params.min_attractor_mass
}

fn is_in_range(target: &Body, candidate: &Body, params: &SelectionParams) -> bool {
    let distance = candidate.position.distance(target.position);
    params.range.reaches(distance, candidate.max_attraction_range)
}

/// Closest eligible candidate within attraction range.
pub fn nearest<'a>(
    target: &Body,
    candidates: impl IntoIterator<Item = &'a Body>,
    params: &SelectionParams,
) -> Option<BodyId> {
    let mut best: Option<(BodyId, f64)> = None;
    for candidate in candidates {
        if !is_eligible(target, candidate, params) || !is_in_range(target, candidate, params) {
            continue;
        }
        let distance_sq = candidate.position.distance_squared(target.position);
        if best.is_none_or(|(_, best_sq)| distance_sq < best_sq) {
            best = Some((candidate.id(), distance_sq));
        }
    }
    best.map(|(id, _)| id)
}

/// Heaviest eligible candidate, regardless of distance.
pub fn biggest<'a>(
    target: &Body,
    candidates: impl IntoIterator<Item = &'a Body>,
    params: &SelectionParams,
) -> Option<BodyId> {
    let mut best: Option<(BodyId, f64)> = None;
    for candidate in candidates {
        if !is_eligible(target, candidate, params) {
            continue;
        }
        if best.is_none_or(|(_, best_mass)| candidate.mass > best_mass) {
            best = Some((candidate.id(), candidate.mass));
        }
    }
    best.map(|(id, _)| id)
}

/// Candidate that dominates the target's acceleration.
///
/// Candidates are compared pairwise: the challenger replaces the current
/// pick when the current pick is perturbed by the challenger more than the
/// other way round.
pub fn most_proper<'a>(
    target: &Body,
    candidates: impl IntoIterator<Item = &'a Body>,
    params: &SelectionParams,
) -> Option<BodyId> {
    let mut best: Option<AttractorSource> = None;
    for candidate in candidates {
        if !is_eligible(target, candidate, params) || !is_in_range(target, candidate, params) {
            continue;
        }
        let challenger = as_source(candidate, params.gravitational_constant);
        best = Some(match best {
            None => challenger,
            Some(current) => {
                let current_perturbed =
                    relative_perturbation_ratio(target.position, &current, &challenger);
                let challenger_perturbed =
                    relative_perturbation_ratio(target.position, &challenger, &current);
                if current_perturbed > challenger_perturbed {
                    challenger
                } else {
                    current
                }
            }
        });
    }
    best.map(|source| source.id)
}

fn as_source(body: &Body, gravitational_constant: f64) -> AttractorSource {
    AttractorSource {
        id: body.id(),
        position: body.position,
        mg: body.mg(gravitational_constant),
        max_range: body.max_attraction_range,
    }
}

/// Nearest of several queued candidates, by distance from `position`.
pub(crate) fn nearest_queued<'a>(
    position: DVec3,
    queued: impl IntoIterator<Item = &'a Body>,
) -> Option<BodyId> {
    queued
        .into_iter()
        .fold(None::<(BodyId, f64)>, |best, body| {
            let distance_sq = body.position.distance_squared(position);
            match best {
                Some((_, best_sq)) if best_sq <= distance_sq => best,
                _ => Some((body.id(), distance_sq)),
            }
        })
        .map(|(id, _)| id)
}
