//! Intersection light controller for the signal simulation
//!
//! Each tick an intersection may grant a green light, ages the queues of its
//! incoming streets and lets one ready car through the active street.

use log::debug;
use rand::RngCore;
use std::collections::BTreeSet;

use super::car::SimCar;
use super::error::SimError;
use super::policy::{Candidate, GrantContext, SchedulingPolicy};
use super::road_network::SimRoadNetwork;
use super::types::{CarId, Grant, IntersectionId, StreetId, Tick};

/// Light state of an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    /// No street has been granted yet
    Unscheduled,
    /// `street` holds the green light since `since`
    Active { street: StreetId, since: Tick },
}

/// A car let through the green light during an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// The car continues onto an outgoing street
    Moved { car: SimCar, onto: StreetId },
    /// The car finished its path
    Arrived(CarId),
}

#[derive(Debug, Clone)]
pub struct SimIntersection {
    pub id: IntersectionId,
    incoming: Vec<StreetId>,
    outgoing: Vec<StreetId>,
    grants: Vec<Grant>,
    state: LightState,
    /// Incoming streets never granted; only ever shrinks
    candidates: BTreeSet<StreetId>,
}

impl SimIntersection {
    pub fn new(id: IntersectionId, incoming: Vec<StreetId>, outgoing: Vec<StreetId>) -> Self {
        let candidates = incoming.iter().copied().collect();
        Self {
            id,
            incoming,
            outgoing,
            grants: Vec::new(),
            state: LightState::Unscheduled,
            candidates,
        }
    }

    pub fn incoming(&self) -> &[StreetId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[StreetId] {
        &self.outgoing
    }

    /// Grants committed so far, in tick order
    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    pub fn active_street(&self) -> Option<StreetId> {
        match self.state {
            LightState::Unscheduled => None,
            LightState::Active { street, .. } => Some(street),
        }
    }

    pub fn candidates(&self) -> impl Iterator<Item = StreetId> + '_ {
        self.candidates.iter().copied()
    }

    /// Whether the grant step runs at `tick`
    fn grant_window_open(&self, tick: Tick, cooldown: Option<Tick>) -> bool {
        if self.candidates.is_empty() {
            return false;
        }
        match self.state {
            LightState::Unscheduled => true,
            LightState::Active { since, .. } => {
                cooldown.is_some_and(|c| tick >= since.saturating_add(c))
            }
        }
    }

    /// Advance this intersection by one tick
    ///
    /// Returns the car that went through the green light, if any. A moved car
    /// is handed back rather than enqueued so that the engine can apply every
    /// transfer after all intersections finished the tick.
    pub fn update(
        &mut self,
        tick: Tick,
        duration: Tick,
        network: &mut SimRoadNetwork,
        policy: &dyn SchedulingPolicy,
        rng: &mut dyn RngCore,
    ) -> Result<Option<Release>, SimError> {
        if self.grant_window_open(tick, policy.rearm_cooldown()) {
            let decision = {
                let candidates = self
                    .candidates
                    .iter()
                    .map(|&street| {
                        network
                            .street(street)
                            .map(|s| Candidate {
                                street,
                                name: &s.name,
                                queue_len: s.queue_len(),
                            })
                            .ok_or(SimError::UnknownStreetId(street))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let ctx = GrantContext {
                    intersection: self.id,
                    tick,
                    duration,
                    candidates: &candidates,
                };
                policy.decide_grant(&ctx, rng)
            };
            if let Some(street) = decision {
                self.grant(street, tick)?;
            }
        }

        for &street in &self.incoming {
            network.expect_street_mut(street)?.tick();
        }

        let LightState::Active { street, .. } = self.state else {
            return Ok(None);
        };
        let Some(mut car) = network.expect_street_mut(street)?.try_dequeue_ready() else {
            return Ok(None);
        };

        match car.pop_next_street() {
            None => Ok(Some(Release::Arrived(car.id))),
            Some(onto) if self.outgoing.contains(&onto) => Ok(Some(Release::Moved { car, onto })),
            Some(onto) => Err(SimError::NotOutgoing {
                intersection: self.id,
                car: car.id,
                street: onto,
            }),
        }
    }

    fn grant(&mut self, street: StreetId, tick: Tick) -> Result<(), SimError> {
        if !self.candidates.remove(&street) {
            return Err(SimError::NotACandidate {
                intersection: self.id,
                street,
            });
        }
        debug!("Intersection {:?} grants {:?} at tick {}", self.id, street, tick);
        self.grants.push(Grant { street, tick });
        self.state = LightState::Active {
            street,
            since: tick,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::policy::{GreedyQueuePolicy, PolicyConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Grants a fixed street whenever asked
    struct FixedPolicy(StreetId);

    impl SchedulingPolicy for FixedPolicy {
        fn decide_grant(&self, _ctx: &GrantContext<'_>, _rng: &mut dyn RngCore) -> Option<StreetId> {
            Some(self.0)
        }
    }

    fn eager(duration: Tick, rearm_cooldown: Option<Tick>) -> GreedyQueuePolicy {
        GreedyQueuePolicy::new(PolicyConfig {
            grant_numerator: f64::from(duration),
            rearm_cooldown,
            ..PolicyConfig::default()
        })
    }

    /// Like `eager`, but a street needs two waiting cars
    fn eager_pairs(duration: Tick) -> GreedyQueuePolicy {
        GreedyQueuePolicy::new(PolicyConfig {
            grant_numerator: f64::from(duration),
            min_grant_queue: 2,
            ..PolicyConfig::default()
        })
    }

    /// Streets "a" and "b" enter intersection 1, "out" leaves it
    fn junction() -> (SimRoadNetwork, SimIntersection) {
        let mut network = SimRoadNetwork::new(3);
        network.add_street("a", IntersectionId(0), IntersectionId(1), 1).unwrap();
        network.add_street("b", IntersectionId(0), IntersectionId(1), 1).unwrap();
        network.add_street("out", IntersectionId(1), IntersectionId(2), 2).unwrap();
        let intersection = SimIntersection::new(
            IntersectionId(1),
            network.incoming_streets(IntersectionId(1)),
            network.outgoing_streets(IntersectionId(1)),
        );
        (network, intersection)
    }

    fn fill(network: &mut SimRoadNetwork, street: usize, cars: usize, path: &[StreetId]) {
        let s = network.street_mut(StreetId(street)).unwrap();
        for i in 0..cars {
            s.enqueue(SimCar::new(CarId(street * 100 + i), path.iter().copied()));
        }
    }

    #[test]
    fn test_grants_longest_queue() {
        let (mut network, mut intersection) = junction();
        fill(&mut network, 0, 2, &[StreetId(2)]);
        fill(&mut network, 1, 3, &[StreetId(2)]);
        let policy = eager(10, None);
        let mut rng = StdRng::seed_from_u64(3);

        intersection.update(0, 10, &mut network, &policy, &mut rng).unwrap();

        assert_eq!(intersection.active_street(), Some(StreetId(1)));
        assert_eq!(intersection.grants(), &[Grant { street: StreetId(1), tick: 0 }]);
        assert_eq!(intersection.candidates().collect::<Vec<_>>(), vec![StreetId(0)]);
    }

    #[test]
    fn test_single_waiting_car_below_threshold_never_granted() {
        let (mut network, mut intersection) = junction();
        fill(&mut network, 0, 1, &[StreetId(2)]);
        let policy = eager_pairs(10);
        let mut rng = StdRng::seed_from_u64(3);

        for t in 0..10 {
            intersection.update(t, 10, &mut network, &policy, &mut rng).unwrap();
        }
        assert_eq!(intersection.state(), LightState::Unscheduled);
        assert!(intersection.grants().is_empty());
    }

    #[test]
    fn test_single_waiting_car_granted_by_default() {
        let (mut network, mut intersection) = junction();
        fill(&mut network, 0, 1, &[StreetId(2)]);
        let policy = eager(10, None);
        let mut rng = StdRng::seed_from_u64(3);

        let release = intersection
            .update(0, 10, &mut network, &policy, &mut rng)
            .unwrap();
        assert_eq!(intersection.grants(), &[Grant { street: StreetId(0), tick: 0 }]);
        assert!(matches!(release, Some(Release::Moved { onto: StreetId(2), .. })));
    }

    #[test]
    fn test_active_street_is_permanent_without_rearm() {
        let (mut network, mut intersection) = junction();
        fill(&mut network, 0, 2, &[StreetId(2)]);
        let policy = eager(20, None);
        let mut rng = StdRng::seed_from_u64(9);

        intersection.update(0, 20, &mut network, &policy, &mut rng).unwrap();
        assert_eq!(intersection.active_street(), Some(StreetId(0)));

        fill(&mut network, 1, 5, &[StreetId(2)]);
        for t in 1..20 {
            intersection.update(t, 20, &mut network, &policy, &mut rng).unwrap();
            assert_eq!(intersection.active_street(), Some(StreetId(0)));
        }
        assert_eq!(intersection.grants().len(), 1);
    }

    #[test]
    fn test_rearm_grants_next_street_after_cooldown() {
        let (mut network, mut intersection) = junction();
        fill(&mut network, 0, 2, &[StreetId(2)]);
        fill(&mut network, 1, 4, &[StreetId(2)]);
        let policy = eager(20, Some(3));
        let mut rng = StdRng::seed_from_u64(9);

        for t in 0..5 {
            intersection.update(t, 20, &mut network, &policy, &mut rng).unwrap();
        }
        assert_eq!(
            intersection.grants(),
            &[
                Grant { street: StreetId(1), tick: 0 },
                Grant { street: StreetId(0), tick: 3 },
            ]
        );
        assert_eq!(intersection.active_street(), Some(StreetId(0)));
        assert_eq!(intersection.candidates().count(), 0);
    }

    #[test]
    fn test_release_moves_car_onto_next_street() {
        let (mut network, mut intersection) = junction();
        fill(&mut network, 0, 2, &[StreetId(2)]);
        let policy = eager(10, None);
        let mut rng = StdRng::seed_from_u64(3);

        let release = intersection
            .update(0, 10, &mut network, &policy, &mut rng)
            .unwrap();
        match release {
            Some(Release::Moved { car, onto }) => {
                assert_eq!(onto, StreetId(2));
                assert_eq!(car.id, CarId(0));
                assert!(car.on_final_street());
            }
            other => panic!("expected a moved car, got {:?}", other),
        }
        assert_eq!(network.street(StreetId(0)).unwrap().queue_len(), 1);
    }

    #[test]
    fn test_car_with_empty_path_arrives() {
        let (mut network, mut intersection) = junction();
        fill(&mut network, 0, 2, &[]);
        let policy = eager(10, None);
        let mut rng = StdRng::seed_from_u64(3);

        let release = intersection
            .update(0, 10, &mut network, &policy, &mut rng)
            .unwrap();
        assert_eq!(release, Some(Release::Arrived(CarId(0))));
    }

    #[test]
    fn test_next_street_not_outgoing_is_fatal() {
        let (mut network, mut intersection) = junction();
        fill(&mut network, 0, 2, &[StreetId(1)]);
        let policy = eager(10, None);
        let mut rng = StdRng::seed_from_u64(3);

        let err = intersection
            .update(0, 10, &mut network, &policy, &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            SimError::NotOutgoing {
                intersection: IntersectionId(1),
                car: CarId(0),
                street: StreetId(1),
            }
        );
    }

    #[test]
    fn test_granting_a_non_candidate_is_fatal() {
        let (mut network, mut intersection) = junction();
        let mut rng = StdRng::seed_from_u64(3);

        let err = intersection
            .update(0, 10, &mut network, &FixedPolicy(StreetId(2)), &mut rng)
            .unwrap_err();
        assert!(matches!(err, SimError::NotACandidate { street: StreetId(2), .. }));
    }

    #[test]
    fn test_queues_age_even_without_grant() {
        let (mut network, mut intersection) = junction();
        fill(&mut network, 1, 1, &[StreetId(2)]);
        let policy = eager_pairs(10);
        let mut rng = StdRng::seed_from_u64(3);

        intersection.update(0, 10, &mut network, &policy, &mut rng).unwrap();
        let ttl = network.street(StreetId(1)).unwrap().cars().next().unwrap().ttl;
        assert_eq!(ttl, 0);
    }
}
