//! Diagnosis loop limits

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::DiagnosisSettings;

const MAX_ITERATIONS_CEILING: u32 = 50;

/// Limits applied to every diagnosis run
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Maximum model calls per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Deadline for listing tools (seconds)
    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,

    /// Deadline for each model call (seconds)
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Deadline for each tool call (seconds)
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl AgentConfig {
    /// Builds run settings from these limits and the remaining sections.
    pub fn to_settings(&self, max_tokens: u32, default_tool: Option<String>) -> DiagnosisSettings {
        let mut settings = DiagnosisSettings::default()
            .with_max_iterations(self.max_iterations)
            .with_catalog_timeout(Duration::from_secs(self.catalog_timeout_secs))
            .with_model_timeout(Duration::from_secs(self.model_timeout_secs))
            .with_tool_timeout(Duration::from_secs(self.tool_timeout_secs))
            .with_max_tokens(max_tokens);
        if let Some(tool) = default_tool.filter(|t| !t.trim().is_empty()) {
            settings = settings.with_default_tool(tool);
        }
        settings
    }

    /// Validate agent configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_CEILING {
            return Err(ValidationError::OutOfRange {
                field: "agent.max_iterations",
                min: 1,
                max: MAX_ITERATIONS_CEILING as u64,
                actual: self.max_iterations as u64,
            });
        }
        for (field, secs) in [
            ("agent.catalog_timeout_secs", self.catalog_timeout_secs),
            ("agent.model_timeout_secs", self.model_timeout_secs),
            ("agent.tool_timeout_secs", self.tool_timeout_secs),
        ] {
            if secs == 0 || secs > 600 {
                return Err(ValidationError::OutOfRange {
                    field,
                    min: 1,
                    max: 600,
                    actual: secs,
                });
            }
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            catalog_timeout_secs: default_catalog_timeout_secs(),
            model_timeout_secs: default_model_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_max_iterations() -> u32 {
    10
}

fn default_catalog_timeout_secs() -> u64 {
    20
}

fn default_model_timeout_secs() -> u64 {
    90
}

fn default_tool_timeout_secs() -> u64 {
    60
}
