//! Reelcap Common Utilities
//!
//! Shared infrastructure for all Reelcap crates:
//! - Error types and result aliases
//! - Tracing/logging initialization
//! - External tool discovery
//! - Configuration loading, including the known background-track table

pub mod config;
pub mod error;
pub mod logging;
pub mod process;

pub use config::*;
pub use error::*;
