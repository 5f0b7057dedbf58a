//! Core types for the signal simulation
//!
//! Plain identifiers shared by every part of the engine.

/// One discrete step of simulated time
pub type Tick = u32;

/// A wrapper type for intersection IDs
///
/// Intersection ids are dense: `0..n_intersections` as given by the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntersectionId(pub usize);

/// A wrapper type for street IDs
///
/// Street ids follow the order in which streets were declared, which is also
/// the iteration order of every incoming/outgoing street list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreetId(pub usize);

/// A wrapper type for car IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarId(pub usize);

/// A green-light slot committed by an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub street: StreetId,
    pub tick: Tick,
}
