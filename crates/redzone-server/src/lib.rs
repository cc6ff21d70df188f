//! Red Zone HTTP Server Library
//!
//! REST API, configuration and the sweep scheduler, exposed for the binary
//! and for tests.

pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
