//! Emitted traffic-light schedules
//!
//! An intersection's schedule is a `LightCycle`: an ordered list of green
//! phases replayed modulo the cycle period.

use super::error::SimError;
use super::road_network::SimRoadNetwork;
use super::types::{Grant, IntersectionId, StreetId, Tick};

/// One green phase of a light cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreenPhase {
    pub street: StreetId,
    pub name: String,
    pub duration: Tick,
}

/// Repeating sequence of green phases for one intersection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightCycle {
    phases: Vec<GreenPhase>,
    period: Tick,
}

impl LightCycle {
    /// Builds a cycle, dropping phases with a zero duration
    pub fn new(phases: impl IntoIterator<Item = GreenPhase>) -> Self {
        let phases: Vec<GreenPhase> = phases.into_iter().filter(|p| p.duration > 0).collect();
        let period = phases.iter().map(|p| p.duration).sum();
        Self { phases, period }
    }

    pub fn phases(&self) -> &[GreenPhase] {
        &self.phases
    }

    /// Sum of all green durations
    pub fn period(&self) -> Tick {
        self.period
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// The phase holding the green light at absolute tick `tick`
    pub fn green_at(&self, tick: Tick) -> Option<&GreenPhase> {
        self.phase_index_at(tick).map(|i| &self.phases[i])
    }

    /// Index into `phases()` of the phase that is green at `tick`
    pub fn phase_index_at(&self, tick: Tick) -> Option<usize> {
        if self.period == 0 {
            return None;
        }
        let mut offset = tick % self.period;
        for (i, phase) in self.phases.iter().enumerate() {
            if offset < phase.duration {
                return Some(i);
            }
            offset -= phase.duration;
        }
        None
    }
}

/// The emitted schedule of a single intersection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionPlan {
    pub intersection: IntersectionId,
    pub cycle: LightCycle,
}

/// Schedules for every intersection that can carry a light
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulePlan {
    pub intersections: Vec<IntersectionPlan>,
}

impl SchedulePlan {
    pub fn get(&self, intersection: IntersectionId) -> Option<&LightCycle> {
        self.intersections
            .iter()
            .find(|p| p.intersection == intersection)
            .map(|p| &p.cycle)
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }
}

/// One-tick grants at ticks `0, 1, 2, …` for every incoming street
///
/// Used when an intersection never committed a grant. Only ticks before the
/// deadline are produced.
pub fn fallback_grants(incoming: &[StreetId], duration: Tick) -> Vec<Grant> {
    incoming
        .iter()
        .zip(0..duration)
        .map(|(&street, tick)| Grant { street, tick })
        .collect()
}

/// Converts grant ticks into green durations
///
/// Each grant stays green until the next grant, the last one until the
/// deadline.
pub fn cycle_from_grants(
    grants: &[Grant],
    duration: Tick,
    network: &SimRoadNetwork,
) -> Result<LightCycle, SimError> {
    let mut phases = Vec::with_capacity(grants.len());
    for (i, grant) in grants.iter().enumerate() {
        let until = grants.get(i + 1).map_or(duration, |next| next.tick);
        let name = network
            .street_name(grant.street)
            .ok_or(SimError::UnknownStreetId(grant.street))?;
        phases.push(GreenPhase {
            street: grant.street,
            name: name.to_string(),
            duration: until.saturating_sub(grant.tick),
        });
    }
    Ok(LightCycle::new(phases))
}
