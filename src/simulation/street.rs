//! Street queues for the signal simulation

use std::collections::VecDeque;

use super::car::SimCar;
use super::types::{IntersectionId, StreetId, Tick};

/// A one-way street connecting two intersections
///
/// Cars are kept in arrival order. Only the head of the queue may ever leave,
/// so a car can never overtake the cars that entered before it.
#[derive(Debug, Clone)]
pub struct SimStreet {
    pub id: StreetId,
    pub name: String,
    pub start_intersection: IntersectionId,
    pub end_intersection: IntersectionId,
    pub traversal_time: Tick,
    queue: VecDeque<SimCar>,
}

impl SimStreet {
    pub fn new(
        id: StreetId,
        name: impl Into<String>,
        start_intersection: IntersectionId,
        end_intersection: IntersectionId,
        traversal_time: Tick,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            start_intersection,
            end_intersection,
            traversal_time,
            queue: VecDeque::new(),
        }
    }

    /// Put a car at the tail of the queue with a full traversal countdown
    pub fn enqueue(&mut self, mut car: SimCar) {
        car.ttl = self.traversal_time;
        self.queue.push_back(car);
    }

    /// Remove the head car if it has finished traversing the street
    pub fn try_dequeue_ready(&mut self) -> Option<SimCar> {
        match self.queue.front() {
            Some(head) if head.ttl == 0 => self.queue.pop_front(),
            _ => None,
        }
    }

    /// Age every queued car by one tick
    ///
    /// Must run before `try_dequeue_ready` within a tick, so that a car
    /// enqueued with `ttl = traversal_time` is released exactly
    /// `traversal_time` ticks later.
    pub fn tick(&mut self) {
        for car in &mut self.queue {
            car.age();
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn cars(&self) -> impl Iterator<Item = &SimCar> {
        self.queue.iter()
    }
}
