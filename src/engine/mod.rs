//! Core engine: bet placement, settlement, and the poll cycle that drives
//! settlement from the match feed.

pub mod placement;
pub mod settlement;
pub mod cycle;
