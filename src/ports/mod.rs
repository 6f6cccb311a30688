//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (SQLite, the risk model).

mod classifier;
mod storage;

pub use classifier::{ModelError, RiskModel};
pub use storage::Storage;
