//! State module for tracking frontier progress
//!
//! `FrontierState` describes where a single URL stands during one crawl cycle.
//! The store remains the source of truth; these states are what the engine
//! narrates and checks as it moves a URL through a cycle.

mod frontier_state;

pub use frontier_state::FrontierState;
