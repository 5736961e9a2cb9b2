//! Shared types for the Tablestore session driver: typed configuration,
//! the common error type, and structured trace events.

pub mod config;
pub mod error;
pub mod trace;
