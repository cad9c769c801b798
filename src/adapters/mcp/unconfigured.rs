//! Tool service used when no MCP endpoint is configured.

use async_trait::async_trait;

use crate::domain::diagnosis::ToolDescriptor;
use crate::ports::{ToolOutput, ToolService, ToolServiceError};

/// Always reports `NotConfigured`, which puts every run in degraded mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredToolService;

#[async_trait]
impl ToolService for UnconfiguredToolService {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServiceError> {
        Err(ToolServiceError::NotConfigured)
    }

    async fn invoke(
        &self,
        _name: &str,
        _arguments: serde_json::Value,
    ) -> Result<ToolOutput, ToolServiceError> {
        Err(ToolServiceError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_operation_is_not_configured() {
        let service = UnconfiguredToolService;

        assert!(matches!(
            service.list_tools().await,
            Err(ToolServiceError::NotConfigured)
        ));
        assert!(matches!(
            service.invoke("get_tree", serde_json::json!({})).await,
            Err(ToolServiceError::NotConfigured)
        ));
    }
}
