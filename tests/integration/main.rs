//! Integration tests: full place → poll → settle → persist flows against
//! an in-memory match source.

mod mock_source;
mod settlement_flow;
