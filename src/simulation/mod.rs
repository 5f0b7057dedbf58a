//! Discrete-time signal simulation
//!
//! Cars queue on one-way streets while every intersection greedily decides
//! which incoming street gets the green light. The schedule each intersection
//! builds during the run is emitted at the end as a repeating light cycle.

mod car;
mod error;
mod intersection;
mod policy;
mod road_network;
mod schedule;
mod stats;
mod street;
mod types;
mod world;

pub use car::SimCar;
pub use error::SimError;
pub use intersection::{LightState, Release, SimIntersection};
pub use policy::{
    emit_granted, Candidate, GrantContext, GreedyQueuePolicy, PolicyConfig, SchedulingPolicy,
    UsageWeightedPolicy,
};
pub use road_network::SimRoadNetwork;
pub use schedule::{
    cycle_from_grants, fallback_grants, GreenPhase, IntersectionPlan, LightCycle, SchedulePlan,
};
pub use stats::UsageStats;
pub use street::SimStreet;
pub use types::{CarId, Grant, IntersectionId, StreetId, Tick};
pub use world::SimWorld;
