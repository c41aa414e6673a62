//! CLI configuration.
//!
//! Loaded via the `config` crate from `PIECEFLOW_*` environment variables;
//! nested keys use `__` (e.g. `PIECEFLOW_LOG_FILTER=debug`).

use pieceflow_core::ProjectId;
use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PIECEFLOW";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CliConfig {
    /// Base URL flow webhooks are served under.
    #[serde(default = "default_webhook_base_url")]
    pub webhook_base_url: String,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Project new flows are created in; a fresh id is used when unset.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

fn default_webhook_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            webhook_base_url: default_webhook_base_url(),
            log_filter: default_log_filter(),
            project_id: None,
        }
    }
}

impl CliConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(environment())
    }

    fn from_environment(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
