//! Attractor lookup, assignment and the deferred request queue.

use std::collections::BTreeMap;

use bevy::log::debug;

use super::{AttractorRequest, Simulation, SimulationError};
use crate::attractor::{nearest_queued, AttractorStrategy};
use crate::types::BodyId;

impl Simulation {
    /// Best attractor for a body by the given heuristic, without assigning it.
    pub fn find_attractor(
        &self,
        id: BodyId,
        strategy: AttractorStrategy,
    ) -> Result<Option<BodyId>, SimulationError> {
        let idx = self.index_of(id)?;
        Ok(strategy.select(&self.bodies[idx], &self.bodies, &self.selection_params()))
    }

    pub fn find_nearest_attractor(&self, id: BodyId) -> Result<Option<BodyId>, SimulationError> {
        self.find_attractor(id, AttractorStrategy::Nearest)
    }

    pub fn find_biggest_attractor(&self, id: BodyId) -> Result<Option<BodyId>, SimulationError> {
        self.find_attractor(id, AttractorStrategy::Biggest)
    }

    pub fn find_most_proper_attractor(&self, id: BodyId) -> Result<Option<BodyId>, SimulationError> {
        self.find_attractor(id, AttractorStrategy::MostProper)
    }

    /// Find and immediately assign an attractor; `None` detaches the body.
    pub fn set_attractor_by(
        &mut self,
        id: BodyId,
        strategy: AttractorStrategy,
    ) -> Result<Option<BodyId>, SimulationError> {
        let found = self.find_attractor(id, strategy)?;
        self.set_attractor(id, found)?;
        Ok(found)
    }

    pub fn set_nearest_attractor_for_body(&mut self, id: BodyId) -> Result<Option<BodyId>, SimulationError> {
        self.set_attractor_by(id, AttractorStrategy::Nearest)
    }

    pub fn set_biggest_attractor_for_body(&mut self, id: BodyId) -> Result<Option<BodyId>, SimulationError> {
        self.set_attractor_by(id, AttractorStrategy::Biggest)
    }

    pub fn set_most_proper_attractor_for_body(
        &mut self,
        id: BodyId,
    ) -> Result<Option<BodyId>, SimulationError> {
        self.set_attractor_by(id, AttractorStrategy::MostProper)
    }

    /// Assign each body its most proper attractor, in registration order.
    pub fn assign_most_proper_attractors(&mut self) {
        let params = self.selection_params();
        for idx in 0..self.bodies.len() {
            let found = AttractorStrategy::MostProper.select(&self.bodies[idx], &self.bodies, &params);
            self.assign_attractor(idx, found);
        }
    }

    /// Immediately set or clear a body's attractor.
    pub fn set_attractor(
        &mut self,
        id: BodyId,
        attractor: Option<BodyId>,
    ) -> Result<(), SimulationError> {
        let idx = self.index_of(id)?;
        if let Some(attractor) = attractor {
            if attractor == id {
                return Err(SimulationError::SelfAttraction(id));
            }
            self.index_of(attractor)?;
        }
        self.assign_attractor(idx, attractor);
        Ok(())
    }

    fn assign_attractor(&mut self, idx: usize, attractor: Option<BodyId>) {
        let body = &mut self.bodies[idx];
        if body.attractor != attractor {
            body.attractor = attractor;
            body.orbit.is_dirty = true;
        }
    }

    /// Queue an attractor change, applied at the start of the next tick.
    ///
    /// Requests for the current attractor or for a body no heavier than the
    /// requester are ignored; returns whether the request was queued. When a
    /// body has several requests queued, the nearest candidate wins. A single
    /// request with `check_in_range` only applies if the candidate is within
    /// attraction range at that point.
    pub fn request_attractor(
        &mut self,
        id: BodyId,
        attractor: BodyId,
        check_in_range: bool,
    ) -> Result<bool, SimulationError> {
        let idx = self.index_of(id)?;
        if attractor == id {
            return Err(SimulationError::SelfAttraction(id));
        }
        let candidate = &self.bodies[self.index_of(attractor)?];
        let body = &self.bodies[idx];
        if body.attractor == Some(attractor) || candidate.mass <= body.mass {
            return Ok(false);
        }
        self.pending_attractors.push(AttractorRequest {
            body: id,
            attractor,
            check_in_range,
        });
        Ok(true)
    }

    /// Whether any attractor requests wait for the next tick.
    pub fn has_pending_attractor_requests(&self) -> bool {
        !self.pending_attractors.is_empty()
    }

    pub(super) fn resolve_attractor_requests(&mut self) {
        if self.pending_attractors.is_empty() {
            return;
        }
        let mut grouped: BTreeMap<BodyId, Vec<AttractorRequest>> = BTreeMap::new();
        for request in std::mem::take(&mut self.pending_attractors) {
            grouped.entry(request.body).or_default().push(request);
        }

        for (id, requests) in grouped {
            let Some(&idx) = self.index.get(&id) else {
                continue;
            };
            let position = self.bodies[idx].position;
            let chosen = match requests.as_slice() {
                [single] => {
                    let Some(candidate) = self.body(single.attractor) else {
                        continue;
                    };
                    let distance = candidate.position.distance(position);
                    let in_range = self
                        .attraction_range
                        .reaches(distance, candidate.max_attraction_range);
                    if single.check_in_range && !in_range {
                        continue;
                    }
                    single.attractor
                }
                _ => {
                    let candidates = requests.iter().filter_map(|r| self.body(r.attractor));
                    match nearest_queued(position, candidates) {
                        Some(nearest) => nearest,
                        None => continue,
                    }
                }
            };
            debug!("Resolved {} queued attractor request(s) for {}: {}", requests.len(), id, chosen);
            self.assign_attractor(idx, Some(chosen));
        }
    }

    /// Enable or disable the periodic most-proper attractor search for a body.
    ///
    /// Enabled searches use the simulation's current search interval.
    pub fn set_continuous_attractor_search(
        &mut self,
        id: BodyId,
        enabled: bool,
    ) -> Result<(), SimulationError> {
        let idx = self.index_of(id)?;
        let interval = self.attractor_search_interval;
        let body = &mut self.bodies[idx];
        body.attractor_search_interval = enabled.then_some(interval);
        body.search_timer = 0.0;
        Ok(())
    }

    pub(super) fn run_attractor_searches(&mut self, delta_time: f64) {
        let params = self.selection_params();
        for idx in 0..self.bodies.len() {
            let body = &mut self.bodies[idx];
            let Some(interval) = body.attractor_search_interval else {
                continue;
            };
            if !body.is_active {
                continue;
            }
            body.search_timer += delta_time;
            if body.search_timer < interval {
                continue;
            }
            body.search_timer = 0.0;

            let found = AttractorStrategy::MostProper.select(&self.bodies[idx], &self.bodies, &params);
            let body = &self.bodies[idx];
            if body.attractor != found {
                debug!(
                    "Attractor search moved '{}' ({}) from {:?} to {:?}",
                    body.name,
                    body.id(),
                    body.attractor,
                    found
                );
            }
            self.assign_attractor(idx, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::DVec3;

    use super::*;
    use crate::body::Body;

    fn scene() -> (Simulation, BodyId, BodyId, BodyId) {
        let mut sim = Simulation::new();
        let probe = sim
            .add_body(Body::new("probe", 1.0, DVec3::ZERO, DVec3::ZERO))
            .unwrap();
        let moon = sim
            .add_body(Body::new("moon", 100.0, DVec3::new(10.0, 0.0, 0.0), DVec3::ZERO).fixed())
            .unwrap();
        let planet = sim
            .add_body(Body::new("planet", 1e6, DVec3::new(0.0, 50.0, 0.0), DVec3::ZERO).fixed())
            .unwrap();
        (sim, probe, moon, planet)
    }

    #[test]
    fn test_find_and_set_by_strategy() {
        let (mut sim, probe, moon, planet) = scene();
        assert_eq!(sim.find_nearest_attractor(probe).unwrap(), Some(moon));
        assert_eq!(sim.find_most_proper_attractor(probe).unwrap(), Some(planet));
        assert_eq!(sim.find_biggest_attractor(moon).unwrap(), Some(planet));

        assert_eq!(sim.set_nearest_attractor_for_body(probe).unwrap(), Some(moon));
        assert_eq!(sim.body(probe).unwrap().attractor, Some(moon));
        assert_eq!(sim.set_biggest_attractor_for_body(probe).unwrap(), Some(planet));
        // The heaviest body has nothing heavier to orbit but still gets a pick
        assert_eq!(sim.set_most_proper_attractor_for_body(planet).unwrap(), Some(moon));
    }

    #[test]
    fn test_set_attractor_rejects_self_and_unknown() {
        let (mut sim, probe, _, _) = scene();
        assert_eq!(
            sim.set_attractor(probe, Some(probe)),
            Err(SimulationError::SelfAttraction(probe))
        );
        assert_eq!(
            sim.set_attractor(probe, Some(BodyId(42))),
            Err(SimulationError::UnknownBody(BodyId(42)))
        );
        sim.set_attractor(probe, None).unwrap();
    }

    #[test]
    fn test_requests_apply_on_next_tick() {
        let (mut sim, probe, moon, _) = scene();
        assert!(sim.request_attractor(probe, moon, false).unwrap());
        assert_eq!(sim.body(probe).unwrap().attractor, None);
        assert!(sim.has_pending_attractor_requests());

        sim.tick(0.0);
        assert_eq!(sim.body(probe).unwrap().attractor, Some(moon));
        assert!(!sim.has_pending_attractor_requests());
    }

    #[test]
    fn test_nearest_of_several_requests_wins() {
        let (mut sim, probe, moon, planet) = scene();
        sim.request_attractor(probe, planet, true).unwrap();
        sim.request_attractor(probe, moon, true).unwrap();
        sim.tick(0.0);
        assert_eq!(sim.body(probe).unwrap().attractor, Some(moon));
    }

    #[test]
    fn test_requests_ignored_when_lighter_current_or_out_of_range() {
        let (mut sim, probe, moon, planet) = scene();
        assert!(!sim.request_attractor(planet, moon, false).unwrap());

        sim.set_attractor(probe, Some(moon)).unwrap();
        assert!(!sim.request_attractor(probe, moon, false).unwrap());

        sim.set_attraction_range(0.1, 20.0);
        assert!(sim.request_attractor(probe, planet, true).unwrap());
        sim.tick(0.0);
        assert_eq!(sim.body(probe).unwrap().attractor, Some(moon));

        sim.request_attractor(probe, planet, false).unwrap();
        sim.tick(0.0);
        assert_eq!(sim.body(probe).unwrap().attractor, Some(planet));
    }

    #[test]
    fn test_continuous_search_runs_on_interval() {
        let (mut sim, probe, moon, planet) = scene();
        sim.set_attractor_search_interval(0.5);
        sim.set_attractor(probe, Some(moon)).unwrap();
        sim.set_continuous_attractor_search(probe, true).unwrap();
        // Keep the probe in place
        sim.set_fixed_position(probe, true).unwrap();

        sim.tick(0.3);
        assert_eq!(sim.body(probe).unwrap().attractor, Some(moon));
        sim.tick(0.3);
        assert_eq!(sim.body(probe).unwrap().attractor, Some(planet));

        sim.set_attractor(probe, Some(moon)).unwrap();
        sim.set_continuous_attractor_search(probe, false).unwrap();
        sim.tick(10.0);
        assert_eq!(sim.body(probe).unwrap().attractor, Some(moon));
    }

    #[test]
    fn test_builder_search_respects_attractor_reach() {
        let mut sim = Simulation::new();
        let near = sim
            .add_body(Body::new("near", 500.0, DVec3::new(5.0, 0.0, 0.0), DVec3::ZERO).fixed())
            .unwrap();
        sim.add_body(
            Body::new("far", 1e6, DVec3::new(0.0, 30.0, 0.0), DVec3::ZERO)
                .fixed()
                .with_max_attraction_range(20.0),
        )
        .unwrap();
        let probe = sim
            .add_body(
                Body::new("probe", 1.0, DVec3::ZERO, DVec3::ZERO)
                    .fixed()
                    .with_attractor_search(0.25),
            )
            .unwrap();

        sim.tick(0.1);
        assert_eq!(sim.body(probe).unwrap().attractor, None);
        sim.tick(0.2);
        assert_eq!(sim.body(probe).unwrap().attractor, Some(near));
    }

    #[test]
    fn test_assign_most_proper_attractors() {
        let (mut sim, probe, moon, planet) = scene();
        sim.assign_most_proper_attractors();
        assert_eq!(sim.body(probe).unwrap().attractor, Some(planet));
        assert_eq!(sim.body(moon).unwrap().attractor, Some(planet));
        assert_eq!(sim.body(planet).unwrap().attractor, Some(moon));
    }
}
