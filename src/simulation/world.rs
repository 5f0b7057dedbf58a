//! Main simulation world that ties everything together
//!
//! Builds the network from a parsed scenario, runs the tick loop and emits the
//! final schedule.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::car::SimCar;
use super::error::SimError;
use super::intersection::{Release, SimIntersection};
use super::policy::SchedulingPolicy;
use super::road_network::SimRoadNetwork;
use super::schedule::{IntersectionPlan, SchedulePlan};
use super::stats::UsageStats;
use super::types::{CarId, IntersectionId, StreetId, Tick};
use crate::scenario::Scenario;

/// The main simulation world
pub struct SimWorld {
    /// Streets and their queues
    pub network: SimRoadNetwork,

    /// All intersections, indexed by id
    intersections: Vec<SimIntersection>,

    /// Usage snapshot taken when the cars were placed
    usage: UsageStats,

    /// Simulation deadline
    duration: Tick,

    /// Next tick to simulate
    time: Tick,

    total_cars: usize,
    arrived_cars: usize,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl SimWorld {
    /// Builds the network and places every car on its first street
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, SimError> {
        let mut network = SimRoadNetwork::new(scenario.intersection_count);
        for street in &scenario.streets {
            network.add_street(
                &street.name,
                IntersectionId(street.start),
                IntersectionId(street.end),
                street.traversal_time,
            )?;
        }

        let mut paths = Vec::with_capacity(scenario.cars.len());
        for (index, car) in scenario.cars.iter().enumerate() {
            paths.push(resolve_path(&network, CarId(index), &car.path)?);
        }
        let usage = UsageStats::from_paths(network.street_count(), paths.iter());

        for (index, path) in paths.into_iter().enumerate() {
            let mut car = SimCar::new(CarId(index), path);
            let first = car.pop_next_street().ok_or(SimError::EmptyPath { car: car.id })?;
            network.expect_street_mut(first)?.enqueue(car);
        }

        let intersections = (0..scenario.intersection_count)
            .map(IntersectionId)
            .map(|id| {
                SimIntersection::new(
                    id,
                    network.incoming_streets(id),
                    network.outgoing_streets(id),
                )
            })
            .collect();

        Ok(Self {
            network,
            intersections,
            usage,
            duration: scenario.duration,
            time: 0,
            total_cars: scenario.cars.len(),
            arrived_cars: 0,
            rng: None,
        })
    }

    /// Use a seeded RNG so that repeated runs produce identical schedules
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    pub fn intersections(&self) -> &[SimIntersection] {
        &self.intersections
    }

    pub fn usage_stats(&self) -> &UsageStats {
        &self.usage
    }

    pub fn duration(&self) -> Tick {
        self.duration
    }

    /// Next tick to be simulated
    pub fn time(&self) -> Tick {
        self.time
    }

    pub fn is_finished(&self) -> bool {
        self.time >= self.duration
    }

    /// Cars released from the final street of their path so far
    pub fn arrived_cars(&self) -> usize {
        self.arrived_cars
    }

    /// Simulate one tick
    ///
    /// Every intersection updates against the state left by the previous
    /// tick; cars released during this tick only reach their next street
    /// once all intersections are done.
    pub fn tick(&mut self, policy: &dyn SchedulingPolicy) -> Result<(), SimError> {
        if self.is_finished() {
            return Ok(());
        }

        let mut thread_rng;
        let rng: &mut dyn RngCore = match &mut self.rng {
            Some(rng) => rng,
            None => {
                thread_rng = rand::rng();
                &mut thread_rng
            }
        };

        let tick = self.time;
        let mut transfers = Vec::new();
        for intersection in &mut self.intersections {
            match intersection.update(tick, self.duration, &mut self.network, policy, &mut *rng)? {
                Some(Release::Moved { car, onto }) => transfers.push((car, onto)),
                Some(Release::Arrived(car)) => {
                    debug!("Car {:?} arrived at tick {}", car, tick);
                    self.arrived_cars += 1;
                }
                None => {}
            }
        }

        for (car, onto) in transfers {
            self.network.expect_street_mut(onto)?.enqueue(car);
        }

        self.time += 1;
        Ok(())
    }

    /// Run every remaining tick, then emit the schedule
    pub fn run(&mut self, policy: &dyn SchedulingPolicy) -> Result<SchedulePlan, SimError> {
        info!(
            "Simulating {} ticks over {} intersections",
            self.duration,
            self.intersections.len()
        );
        while !self.is_finished() {
            self.tick(policy)?;
        }
        self.emit(policy)
    }

    /// Build the schedule from the current intersection state
    ///
    /// Intersections without incoming streets cannot hold a light and are
    /// left out.
    pub fn emit(&self, policy: &dyn SchedulingPolicy) -> Result<SchedulePlan, SimError> {
        let mut plan = SchedulePlan::default();
        for intersection in &self.intersections {
            if intersection.incoming().is_empty() {
                continue;
            }
            let cycle = policy.emit(intersection, &self.network, self.duration)?;
            if cycle.is_empty() {
                continue;
            }
            plan.intersections.push(IntersectionPlan {
                intersection: intersection.id,
                cycle,
            });
        }
        Ok(plan)
    }

    /// Log a summary of the world state
    pub fn log_summary(&self) {
        let granted = self
            .intersections
            .iter()
            .filter(|i| !i.grants().is_empty())
            .count();
        info!("=== Signal Simulation Summary ===");
        info!("Tick: {}/{}", self.time, self.duration);
        info!(
            "Intersections: {}, Streets: {}",
            self.network.intersection_count(),
            self.network.street_count()
        );
        info!("Intersections with grants: {}", granted);
        info!("Unused streets: {}", self.usage.unused_streets());
        info!("Cars: {}", self.total_cars);
        info!("Cars released at destination: {}", self.arrived_cars);
        info!("Cars still queued: {}", self.network.queued_cars());
    }
}

/// Resolve a car's street names and check that consecutive streets connect
fn resolve_path(
    network: &SimRoadNetwork,
    car: CarId,
    names: &[String],
) -> Result<Vec<StreetId>, SimError> {
    if names.is_empty() {
        return Err(SimError::EmptyPath { car });
    }

    let mut path = Vec::with_capacity(names.len());
    for name in names {
        let id = network.street_id(name).ok_or_else(|| SimError::UnknownStreet {
            car,
            name: name.clone(),
        })?;
        path.push(id);
    }

    for (from, to) in path.iter().zip(path.iter().skip(1)) {
        let (Some(from), Some(to)) = (network.street(*from), network.street(*to)) else {
            continue;
        };
        if from.end_intersection != to.start_intersection {
            return Err(SimError::DisconnectedPath {
                car,
                from: from.name.clone(),
                to: to.name.clone(),
            });
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::policy::{GreedyQueuePolicy, PolicyConfig};

    const CHAIN: &str = "\
10 3 2 3 100
0 1 a 1
1 2 b 5
2 a b
2 a b
2 a b
";

    fn eager(duration: Tick) -> GreedyQueuePolicy {
        GreedyQueuePolicy::new(PolicyConfig {
            grant_numerator: f64::from(duration),
            ..PolicyConfig::default()
        })
    }

    #[test]
    fn test_cars_placed_on_first_street() {
        let world = SimWorld::from_scenario(&Scenario::parse(CHAIN).unwrap()).unwrap();
        let a = world.network.street(StreetId(0)).unwrap();
        assert_eq!(a.queue_len(), 3);
        assert!(a.cars().all(|c| c.ttl == 1));
        assert!(a
            .cars()
            .all(|c| c.remaining_path().collect::<Vec<_>>() == vec![StreetId(1)]));
        assert_eq!(world.usage_stats().usage(StreetId(0)), 3);
        assert_eq!(world.usage_stats().usage(StreetId(1)), 3);
    }

    #[test]
    fn test_transfers_are_applied_after_the_tick() {
        let mut world = SimWorld::from_scenario(&Scenario::parse(CHAIN).unwrap())
            .unwrap()
            .with_seed(1);
        let policy = eager(10);

        world.tick(&policy).unwrap();

        // Released from "a" during tick 0, not yet aged by intersection 2
        let b = world.network.street(StreetId(1)).unwrap();
        assert_eq!(b.queue_len(), 1);
        assert_eq!(b.cars().next().unwrap().ttl, 5);
        assert_eq!(world.time(), 1);
    }

    #[test]
    fn test_run_emits_granted_schedules() {
        let mut world = SimWorld::from_scenario(&Scenario::parse(CHAIN).unwrap())
            .unwrap()
            .with_seed(1);
        let plan = world.run(&eager(10)).unwrap();

        let first = plan.get(IntersectionId(1)).unwrap();
        assert_eq!(first.phases().len(), 1);
        assert_eq!(first.phases()[0].name, "a");
        assert_eq!(first.phases()[0].duration, 10);

        // "b" holds one car after tick 0, granted at tick 1
        let second = plan.get(IntersectionId(2)).unwrap();
        assert_eq!(second.phases()[0].name, "b");
        assert_eq!(second.phases()[0].duration, 9);

        assert!(plan.get(IntersectionId(0)).is_none());
        assert!(world.is_finished());
    }

    #[test]
    fn test_unknown_street_in_path() {
        let input = "5 2 1 1 10\n0 1 a 1\n2 a nowhere\n";
        let err = SimWorld::from_scenario(&Scenario::parse(input).unwrap())
            .err()
            .unwrap();
        assert_eq!(
            err,
            SimError::UnknownStreet {
                car: CarId(0),
                name: "nowhere".into()
            }
        );
    }

    #[test]
    fn test_disconnected_path() {
        let input = "5 3 2 1 10\n0 1 a 1\n0 2 b 1\n2 a b\n";
        let err = SimWorld::from_scenario(&Scenario::parse(input).unwrap())
            .err()
            .unwrap();
        assert!(matches!(err, SimError::DisconnectedPath { .. }));
    }

    #[test]
    fn test_empty_path() {
        let input = "5 2 1 1 10\n0 1 a 1\n0\n";
        let err = SimWorld::from_scenario(&Scenario::parse(input).unwrap())
            .err()
            .unwrap();
        assert_eq!(err, SimError::EmptyPath { car: CarId(0) });
    }
}
