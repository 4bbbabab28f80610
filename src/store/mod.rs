//! Graph and run stores owned by the host.
//!
//! The graph runtime knows nothing about identifiers; these traits map ids to
//! frozen graphs and to run records so handlers can look them up. Both ship
//! with in-memory implementations, since nothing survives a restart.

pub mod graphs;
pub mod runs;

pub use graphs::{GraphStore, InMemoryGraphStore};
pub use runs::{InMemoryRunStore, RunRecord, RunStatus, RunStore};
