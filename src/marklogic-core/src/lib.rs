//! MarkLogic Core Library
//!
//! Transport-free pieces shared by the MarkLogic REST client:
//! - Connection settings loaded from JSON files or the environment
//! - Resource models (collections, graph targets, content types)
//! - Tracing subscriber setup

pub mod config;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use config::{ClientConfig, LATEST_API_VERSION};
pub use models::*;
