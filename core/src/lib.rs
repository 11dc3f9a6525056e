//! lattice-core: the inventory risk and recommendation engine.
//!
//! Maintains a simulated, continuously drifting view of multi-channel
//! inventory state and derives stockout forecasts, ranked remediation
//! actions, alert root-cause chains, and supplier risk trends from it.
//!
//! The crate is synchronous and runtime-free. The only mutation entry
//! points are [`engine::DriftEngine::tick`] and [`action::execute`];
//! everything else is a pure function over a state snapshot. The
//! serving layer (lattice-server) owns scheduling and locking.

pub mod action;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod health;
pub mod history;
pub mod recommend;
pub mod rng;
pub mod root_cause;
pub mod state;
pub mod supplier;
pub mod types;
