//! Traffic Signal Planner Library
//!
//! Simulates cars driving fixed routes through a road network and builds a
//! traffic-light schedule for every intersection along the way.

pub mod output;
pub mod scenario;
pub mod scoring;
pub mod simulation;
