//! This is a plugin for Bevy game engine to compute distance fields and FlowFields over a cost grid so that many agents can steer towards shared goals without individual pathfinding searches
//!

pub mod navgrid;
pub mod bundle;
pub mod plugin;

pub mod prelude;
