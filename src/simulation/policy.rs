//! Scheduling policies deciding which street gets the green light
//!
//! The engine owns the tick loop; a policy only decides grants for one
//! intersection at a time and shapes the emitted cycle at the end of the run.

use rand::{Rng, RngCore};
use std::cmp::Reverse;

use super::error::SimError;
use super::intersection::SimIntersection;
use super::road_network::SimRoadNetwork;
use super::schedule::{cycle_from_grants, fallback_grants, GreenPhase, LightCycle};
use super::stats::UsageStats;
use super::types::{IntersectionId, StreetId, Tick};

/// Tunable constants of the scheduling heuristics
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    /// Grant gate fires with probability `grant_numerator / duration`
    pub grant_numerator: f64,
    /// Smallest queue a street needs before it can be granted
    pub min_grant_queue: usize,
    /// Ticks after a grant before the intersection may grant again.
    /// `None` keeps the first green forever.
    pub rearm_cooldown: Option<Tick>,
    /// Usage-weighted green time is `usage_base + usage / usage_divisor`
    pub usage_base: f64,
    pub usage_divisor: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            grant_numerator: 30.0,
            min_grant_queue: 1,
            rearm_cooldown: None,
            usage_base: 1.5,
            usage_divisor: 550,
        }
    }
}

/// An incoming street that has not been granted yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub street: StreetId,
    pub name: &'a str,
    pub queue_len: usize,
}

/// Everything a policy may look at when deciding a grant
#[derive(Debug, Clone, Copy)]
pub struct GrantContext<'a> {
    pub intersection: IntersectionId,
    pub tick: Tick,
    pub duration: Tick,
    pub candidates: &'a [Candidate<'a>],
}

pub trait SchedulingPolicy {
    /// Pick the candidate to turn green at this tick, if any
    fn decide_grant(&self, ctx: &GrantContext<'_>, rng: &mut dyn RngCore) -> Option<StreetId>;

    /// Cool-down after which an active intersection may grant again
    fn rearm_cooldown(&self) -> Option<Tick> {
        None
    }

    /// Turn an intersection's final state into its light cycle
    fn emit(
        &self,
        intersection: &SimIntersection,
        network: &SimRoadNetwork,
        duration: Tick,
    ) -> Result<LightCycle, SimError> {
        emit_granted(intersection, network, duration)
    }
}

/// Emits the grants an intersection committed, or the fallback if it never did
pub fn emit_granted(
    intersection: &SimIntersection,
    network: &SimRoadNetwork,
    duration: Tick,
) -> Result<LightCycle, SimError> {
    if intersection.grants().is_empty() {
        let grants = fallback_grants(intersection.incoming(), duration);
        cycle_from_grants(&grants, duration, network)
    } else {
        cycle_from_grants(intersection.grants(), duration, network)
    }
}

/// Greedy online policy: grant the most congested candidate queue
///
/// A random gate throttles how often intersections commit so grants spread
/// over the run instead of all firing on the first tick.
#[derive(Debug, Clone, Default)]
pub struct GreedyQueuePolicy {
    config: PolicyConfig,
}

impl GreedyQueuePolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    fn grant_probability(&self, duration: Tick) -> f64 {
        if duration == 0 {
            return 0.0;
        }
        let p = self.config.grant_numerator / f64::from(duration);
        if p.is_nan() {
            0.0
        } else {
            p.clamp(0.0, 1.0)
        }
    }
}

impl SchedulingPolicy for GreedyQueuePolicy {
    fn decide_grant(&self, ctx: &GrantContext<'_>, rng: &mut dyn RngCore) -> Option<StreetId> {
        if !rng.random_bool(self.grant_probability(ctx.duration)) {
            return None;
        }

        // Longest queue wins, equal queues go to the smallest name
        ctx.candidates
            .iter()
            .filter(|c| c.queue_len >= self.config.min_grant_queue.max(1))
            .max_by(|a, b| {
                a.queue_len
                    .cmp(&b.queue_len)
                    .then_with(|| b.name.cmp(a.name))
            })
            .map(|c| c.street)
    }

    fn rearm_cooldown(&self) -> Option<Tick> {
        self.config.rearm_cooldown
    }
}

/// Offline policy: green time proportional to how many cars use each street
///
/// Never grants during the run; the whole cycle is derived from the usage
/// snapshot when emitting.
#[derive(Debug, Clone)]
pub struct UsageWeightedPolicy {
    stats: UsageStats,
    config: PolicyConfig,
}

impl UsageWeightedPolicy {
    pub fn new(stats: UsageStats, config: PolicyConfig) -> Self {
        Self { stats, config }
    }

    fn weight(&self, street: StreetId) -> f64 {
        let used = self.stats.usage(street);
        if used == 0 {
            return 0.0;
        }
        self.config.usage_base + (used / self.config.usage_divisor.max(1)) as f64
    }
}

impl SchedulingPolicy for UsageWeightedPolicy {
    fn decide_grant(&self, _ctx: &GrantContext<'_>, _rng: &mut dyn RngCore) -> Option<StreetId> {
        None
    }

    fn emit(
        &self,
        intersection: &SimIntersection,
        network: &SimRoadNetwork,
        duration: Tick,
    ) -> Result<LightCycle, SimError> {
        let mut ranked = Vec::with_capacity(intersection.incoming().len());
        for &street in intersection.incoming() {
            let name = network
                .street_name(street)
                .ok_or(SimError::UnknownStreetId(street))?;
            ranked.push((self.stats.usage(street), name, street));
        }
        // Most used first, equal usage by name
        ranked.sort_by(|a, b| Reverse(a.0).cmp(&Reverse(b.0)).then_with(|| a.1.cmp(b.1)));

        let mut budget = duration;
        let mut phases = Vec::new();
        for &(_, name, street) in &ranked {
            let green = (self.weight(street).floor() as Tick).min(budget);
            if green == 0 {
                continue;
            }
            budget -= green;
            phases.push(GreenPhase {
                street,
                name: name.to_string(),
                duration: green,
            });
        }

        if phases.is_empty() && duration > 0 {
            if let Some(&(_, name, street)) = ranked.first() {
                phases.push(GreenPhase {
                    street,
                    name: name.to_string(),
                    duration: 1,
                });
            }
        }
        Ok(LightCycle::new(phases))
    }
}
