//! Run settings shared by the diagnosis handlers.

use std::time::Duration;

/// Limits and options applied to every diagnosis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisSettings {
    /// Maximum model calls per run.
    pub max_iterations: u32,
    /// Deadline for resolving the tool catalog.
    pub catalog_timeout: Duration,
    /// Deadline for each model call.
    pub model_timeout: Duration,
    /// Deadline for each tool call.
    pub tool_timeout: Duration,
    /// Token limit passed to the model, if any.
    pub max_tokens: Option<u32>,
    /// Tool used by single-shot runs.
    pub default_tool: Option<String>,
}

impl Default for DiagnosisSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            catalog_timeout: Duration::from_secs(20),
            model_timeout: Duration::from_secs(90),
            tool_timeout: Duration::from_secs(60),
            max_tokens: None,
            default_tool: None,
        }
    }
}

impl DiagnosisSettings {
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_catalog_timeout(mut self, timeout: Duration) -> Self {
        self.catalog_timeout = timeout;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_default_tool(mut self, tool: impl Into<String>) -> Self {
        self.default_tool = Some(tool.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_limits() {
        let settings = DiagnosisSettings::default();

        assert_eq!(settings.max_iterations, 10);
        assert_eq!(settings.catalog_timeout, Duration::from_secs(20));
        assert_eq!(settings.model_timeout, Duration::from_secs(90));
        assert_eq!(settings.tool_timeout, Duration::from_secs(60));
        assert!(settings.default_tool.is_none());
    }

    #[test]
    fn builder_overrides() {
        let settings = DiagnosisSettings::default()
            .with_max_iterations(3)
            .with_tool_timeout(Duration::from_millis(50))
            .with_default_tool("get_context");

        assert_eq!(settings.max_iterations, 3);
        assert_eq!(settings.tool_timeout, Duration::from_millis(50));
        assert_eq!(settings.default_tool.as_deref(), Some("get_context"));
    }
}
