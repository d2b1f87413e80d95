//! testmend — test maintenance assistant (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod analyzer;
pub mod backend;
pub mod batchfix;
pub mod config;
pub mod constants;
pub mod diff;
pub mod env;
pub mod impact;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod vcs;
