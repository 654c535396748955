//! State machines for the crawl pipeline
//!
//! # Components
//!
//! - `WorkerState`: the per-worker cycle `Idle -> Fetching -> {Success | Failure} -> Idle`,
//!   with `Stopped` reachable from any state
//! - `RunPhase`: the run-level progression `Starting -> Running -> Draining -> Finished`

mod run_phase;
mod worker_state;

pub use run_phase::RunPhase;
pub use worker_state::WorkerState;
