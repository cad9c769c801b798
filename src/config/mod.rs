//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BUILDPRINT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use buildprint_runner::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod agent;
mod ai;
mod error;
mod mcp;
mod server;

pub use agent::AgentConfig;
pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use mcp::McpConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

use crate::application::DiagnosisSettings;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Model service configuration (Anthropic)
    #[serde(default)]
    pub ai: AiConfig,

    /// Tool service configuration (MCP)
    #[serde(default)]
    pub mcp: McpConfig,

    /// Diagnosis loop limits
    #[serde(default)]
    pub agent: AgentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BUILDPRINT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Falls back to a bare `ANTHROPIC_API_KEY` when no prefixed key is set
    ///
    /// # Environment Variable Format
    ///
    /// - `BUILDPRINT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BUILDPRINT__MCP__URL=...` -> `mcp.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BUILDPRINT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if config.ai.anthropic_api_key.is_none() {
            config.ai.anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        }

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.mcp.validate()?;
        self.agent.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Settings handed to the diagnosis handlers
    pub fn diagnosis_settings(&self) -> DiagnosisSettings {
        self.agent
            .to_settings(self.ai.max_tokens, self.mcp.default_tool.clone())
    }
}
