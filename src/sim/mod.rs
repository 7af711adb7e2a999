//! Simulation workloads that drive the controller's client ports.

pub mod traffic;

pub use traffic::{Pattern, RunError, Stream, Workload};
