//! Sky-frame alignment solver.
//!
//! A head-tracked coordinate frame drifts: its origin and north axis
//! rarely match true geography. This module estimates the yaw rotation
//! and planar translation that map recorded observer sightlines onto
//! known landmark reference positions, so the drifting working frame
//! can be corrected to true orientation.
//!
//! The observer records sightlines (origin + direction, in the working
//! frame) toward landmarks whose true sky-frame positions are known.
//! [`AlignmentSolver::solve`] then searches for the transform
//! `rotate θ about +Y, then translate (tx, 0, tz)` minimizing the
//! horizontal-plane distance between each transformed sightline and its
//! landmark. The search is simulated annealing: a heuristic optimizer,
//! not a guaranteed global optimum — in practice a handful of spread
//! sightlines pins the three parameters down tightly.

mod anneal;
mod model;

pub use model::{AlignmentSolver, Observation, Solution, EMPTY_ENERGY};
