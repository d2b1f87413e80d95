//! App-wide constants.
//!
//! Centralises the tool name, config paths, and environment variable
//! names so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "testmend";

/// Crate version, injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local config filename (e.g. `.testmend.toml` in repo root).
pub const CONFIG_FILENAME: &str = ".testmend.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "testmend";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_BACKEND_URL: &str = "TESTMEND_BACKEND_URL";
pub const ENV_ANALYZER_COMMAND: &str = "TESTMEND_ANALYZER";
pub const ENV_TIMEOUT_SECS: &str = "TESTMEND_TIMEOUT_SECS";
