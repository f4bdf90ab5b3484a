//! Foundational data structures, error types, and feed format definitions.

pub mod error;
pub mod feeds;
pub mod models;
