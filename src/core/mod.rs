//! Core pipeline logic.
//!
//! This module contains:
//! - Synchronizer: Catalog → store diffing
//! - Orchestrator: The four pipeline stages

pub mod orchestrator;
pub mod sync;

// Re-export commonly used types
pub use orchestrator::{DiscoveryReport, Orchestrator, PublishReport, SummaryReport, SyncReport};
pub use sync::{new_references, Synchronizer};
