//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.testmend.toml` in repo root
//! 4. `~/.config/testmend/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::env::Env;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub analyzer: AnalyzerConfig,
    pub pipeline: PipelineConfig,
}

/// Reasoning backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub timeout_secs: u64,
    /// Total attempts per backend call, including the first.
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    /// Use the offline mock backend instead of HTTP.
    pub mock: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            retry_max_attempts: 3,
            retry_base_delay_ms: 500,
            mock: false,
        }
    }
}

/// External structural analyzer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Command invoked as `<command> <file> <function>`.
    pub command: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            command: "testmend-analyzer".to_string(),
        }
    }
}

/// Pipeline behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How many times a failed run may be retried through the
    /// user-prompted recovery loop.
    pub max_recovery_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_recovery_attempts: 2,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, repo-local config, then applies
    /// environment variable overrides. CLI flags are merged by the caller
    /// on top of the result.
    pub fn load(repo_root: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::load_file(&global_path)?);
            }
        }

        // Layer 3: repo-local config
        if let Some(root) = repo_root {
            let local_path = root.join(crate::constants::CONFIG_FILENAME);
            if local_path.exists() {
                config.merge(Self::load_file(&local_path)?);
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(crate::constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one; `other` wins for fields it set
    /// to a non-default value.
    fn merge(&mut self, other: Config) {
        let backend_default = BackendConfig::default();
        if other.backend.url != backend_default.url {
            self.backend.url = other.backend.url;
        }
        if other.backend.timeout_secs != backend_default.timeout_secs {
            self.backend.timeout_secs = other.backend.timeout_secs;
        }
        if other.backend.retry_max_attempts != backend_default.retry_max_attempts {
            self.backend.retry_max_attempts = other.backend.retry_max_attempts;
        }
        if other.backend.retry_base_delay_ms != backend_default.retry_base_delay_ms {
            self.backend.retry_base_delay_ms = other.backend.retry_base_delay_ms;
        }
        if other.backend.mock {
            self.backend.mock = true;
        }

        if other.analyzer.command != AnalyzerConfig::default().command {
            self.analyzer.command = other.analyzer.command;
        }

        let pipeline_default = PipelineConfig::default();
        if other.pipeline.max_recovery_attempts != pipeline_default.max_recovery_attempts {
            self.pipeline.max_recovery_attempts = other.pipeline.max_recovery_attempts;
        }
    }

    fn apply_env_vars(&mut self, env: &Env) {
        if let Ok(url) = env.var(crate::constants::ENV_BACKEND_URL) {
            if !url.is_empty() {
                self.backend.url = url;
            }
        }
        if let Ok(command) = env.var(crate::constants::ENV_ANALYZER_COMMAND) {
            if !command.is_empty() {
                self.analyzer.command = command;
            }
        }
        if let Ok(timeout) = env.var(crate::constants::ENV_TIMEOUT_SECS) {
            if let Ok(secs) = timeout.parse() {
                self.backend.timeout_secs = secs;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.backend.url, "http://localhost:8000");
        assert_eq!(config.backend.retry_max_attempts, 3);
        assert!(!config.backend.mock);
        assert_eq!(config.pipeline.max_recovery_attempts, 2);
    }

    #[test]
    fn local_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(crate::constants::CONFIG_FILENAME),
            "[backend]\nurl = \"http://backend.internal:9000\"\nretry_max_attempts = 5\n",
        )
        .unwrap();

        let env = Env::mock(Vec::<(String, String)>::new());
        let config = Config::load(Some(dir.path()), &env).unwrap();
        assert_eq!(config.backend.url, "http://backend.internal:9000");
        assert_eq!(config.backend.retry_max_attempts, 5);
        // Untouched fields keep their defaults
        assert_eq!(config.backend.timeout_secs, 30);
    }

    #[test]
    fn env_overrides_local_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(crate::constants::CONFIG_FILENAME),
            "[backend]\nurl = \"http://from-file:1\"\n",
        )
        .unwrap();

        let env = Env::mock([(crate::constants::ENV_BACKEND_URL, "http://from-env:2")]);
        let config = Config::load(Some(dir.path()), &env).unwrap();
        assert_eq!(config.backend.url, "http://from-env:2");
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(crate::constants::CONFIG_FILENAME),
            "backend = not toml [",
        )
        .unwrap();

        let env = Env::mock(Vec::<(String, String)>::new());
        let err = Config::load(Some(dir.path()), &env).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFile { .. }));
    }
}
