//! # niceday Library
//!
//! This library exposes the niceday CLI modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod logging;

// Re-export niceday_client for convenience
pub use niceday_client;
