//! A navigation query is answered by running a pipeline of computations over
//! a uniform grid: a distance (arrival-time) solve from the goal cells, a
//! steepest-descent derivation of steering directions and a smoothing pass,
//! with each stage's output buffer feeding the next stage
//!

pub mod fields;
pub mod frontier;
pub mod grid_layout;
pub mod utilities;
