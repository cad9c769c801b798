//! MCP tool service configuration

use serde::Deserialize;

use super::error::ValidationError;

/// MCP tool service configuration
///
/// Leaving `url` unset is valid: runs then proceed without tools.
#[derive(Debug, Clone, Deserialize)]
pub struct McpConfig {
    /// Streamable HTTP endpoint of the tool service
    pub url: Option<String>,

    /// Bearer token sent with every request
    pub token: Option<String>,

    /// Tool invoked by single-shot runs
    pub default_tool: Option<String>,

    /// Client name announced during the handshake
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

impl McpConfig {
    /// Endpoint, if one is configured and non-blank
    pub fn endpoint(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// Validate MCP configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = self.endpoint() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidUrl {
                    field: "mcp.url",
                    url: url.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            default_tool: None,
            client_name: default_client_name(),
        }
    }
}

fn default_client_name() -> String {
    "buildprint-runner".to_string()
}
