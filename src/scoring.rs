//! Plan scoring
//!
//! Replays an emitted plan under the contest rules. Every car starts queued at
//! the end of its first street. Each tick, an intersection's green street lets
//! its head car through if that car has reached the end of the street. A car
//! reaching the end of its last street at or before the deadline scores the
//! bonus plus one point per tick to spare.

use std::collections::{HashMap, VecDeque};

use crate::scenario::Scenario;
use crate::simulation::{SchedulePlan, Tick};

/// Errors for a plan that does not match its scenario.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScoreError {
    /// The plan or a car path names a street the scenario never declared.
    #[error("unknown street '{0}'")]
    UnknownStreet(String),

    /// A phase gives the green light to a street that ends elsewhere.
    #[error("street '{street}' does not enter intersection {intersection}")]
    NotIncoming { intersection: usize, street: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreReport {
    pub total_cars: usize,
    pub cars_arrived: usize,
    pub points: u64,
    pub earliest_arrival: Option<Tick>,
    pub latest_arrival: Option<Tick>,
}

impl ScoreReport {
    fn record_arrival(&mut self, arrival: Tick, duration: Tick, bonus: u64) {
        self.cars_arrived += 1;
        self.points += bonus + u64::from(duration - arrival);
        self.earliest_arrival = Some(self.earliest_arrival.map_or(arrival, |t| t.min(arrival)));
        self.latest_arrival = Some(self.latest_arrival.map_or(arrival, |t| t.max(arrival)));
    }

    /// Share of cars that reached their destination, in percent
    pub fn arrival_rate(&self) -> f64 {
        if self.total_cars == 0 {
            0.0
        } else {
            self.cars_arrived as f64 / self.total_cars as f64 * 100.0
        }
    }
}

/// A car waiting at the end of a street from `ready_at` on
#[derive(Debug, Clone, Copy)]
struct Waiting {
    car: usize,
    ready_at: Tick,
}

pub fn score(scenario: &Scenario, plan: &SchedulePlan) -> Result<ScoreReport, ScoreError> {
    let index: HashMap<&str, usize> = scenario
        .streets
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();
    let lookup = |name: &str| {
        index
            .get(name)
            .copied()
            .ok_or_else(|| ScoreError::UnknownStreet(name.to_string()))
    };

    // Street index of every phase, parallel to each cycle's phases
    let mut lights = Vec::with_capacity(plan.len());
    for entry in &plan.intersections {
        let mut streets = Vec::with_capacity(entry.cycle.phases().len());
        for phase in entry.cycle.phases() {
            let street = lookup(&phase.name)?;
            if scenario.streets[street].end != entry.intersection.0 {
                return Err(ScoreError::NotIncoming {
                    intersection: entry.intersection.0,
                    street: phase.name.clone(),
                });
            }
            streets.push(street);
        }
        lights.push((&entry.cycle, streets));
    }

    let paths = scenario
        .cars
        .iter()
        .map(|car| car.path.iter().map(|name| lookup(name)).collect())
        .collect::<Result<Vec<Vec<usize>>, _>>()?;

    let duration = scenario.duration;
    let bonus = scenario.bonus_points;
    let mut report = ScoreReport {
        total_cars: paths.len(),
        ..ScoreReport::default()
    };
    let mut queues: Vec<VecDeque<Waiting>> = vec![VecDeque::new(); scenario.streets.len()];
    let mut position = vec![0usize; paths.len()];

    for (car, path) in paths.iter().enumerate() {
        match path.first() {
            Some(&first) if path.len() > 1 => queues[first].push_back(Waiting { car, ready_at: 0 }),
            // Already at the end of its only street
            Some(_) => report.record_arrival(0, duration, bonus),
            None => {}
        }
    }

    for tick in 0..duration {
        for (cycle, streets) in &lights {
            let Some(phase) = cycle.phase_index_at(tick) else {
                continue;
            };
            let queue = &mut queues[streets[phase]];
            if !queue.front().is_some_and(|w| w.ready_at <= tick) {
                continue;
            }
            let Some(Waiting { car, .. }) = queue.pop_front() else {
                continue;
            };

            position[car] += 1;
            let path = &paths[car];
            let next = path[position[car]];
            // Past Tick::MAX the car can never reach the end of `next`
            let Some(arrival) = tick.checked_add(scenario.streets[next].traversal_time) else {
                continue;
            };
            if position[car] + 1 == path.len() {
                if arrival <= duration {
                    report.record_arrival(arrival, duration, bonus);
                }
            } else {
                queues[next].push_back(Waiting {
                    car,
                    ready_at: arrival,
                });
            }
        }
    }

    Ok(report)
}
