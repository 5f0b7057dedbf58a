//! Car state for the signal simulation

use std::collections::VecDeque;

use super::types::{CarId, StreetId, Tick};

/// A car in the signal simulation
///
/// The street the car currently sits on is not part of `remaining_path`;
/// it is implied by whichever street queue owns the car.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimCar {
    pub id: CarId,
    remaining_path: VecDeque<StreetId>,
    /// Ticks left before the car may leave its current street
    pub ttl: Tick,
}

impl SimCar {
    pub fn new(id: CarId, remaining_path: impl IntoIterator<Item = StreetId>) -> Self {
        Self {
            id,
            remaining_path: remaining_path.into_iter().collect(),
            ttl: 0,
        }
    }

    /// Removes and returns the next street to drive onto
    pub fn pop_next_street(&mut self) -> Option<StreetId> {
        self.remaining_path.pop_front()
    }

    pub fn peek_next_street(&self) -> Option<StreetId> {
        self.remaining_path.front().copied()
    }

    pub fn remaining_path(&self) -> impl Iterator<Item = StreetId> + '_ {
        self.remaining_path.iter().copied()
    }

    /// True once the car is on the last street of its path
    pub fn on_final_street(&self) -> bool {
        self.remaining_path.is_empty()
    }

    /// Count down one tick, never below zero
    pub fn age(&mut self) {
        self.ttl = self.ttl.saturating_sub(1);
    }
}
