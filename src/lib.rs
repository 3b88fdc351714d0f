//! BETSIM: simulated single-bet sportsbook.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod odds;
pub mod feed;
pub mod engine;
pub mod storage;
pub mod render;
