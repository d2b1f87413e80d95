//! Configuration loading and layering.
//!
//! Handles `.testmend.toml` loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering.

pub mod loader;

pub use loader::{AnalyzerConfig, BackendConfig, Config, ConfigError, PipelineConfig};
