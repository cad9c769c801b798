//! CatalogResolver - Best-effort tool catalog lookup for one run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::deadline::with_deadline;
use crate::domain::diagnosis::ToolCatalog;
use crate::ports::ToolService;

/// Resolves the tool catalog. Never fails: every problem becomes
/// `ToolCatalog::Unavailable`.
pub struct CatalogResolver {
    tools: Arc<dyn ToolService>,
    timeout: Duration,
}

impl CatalogResolver {
    pub fn new(tools: Arc<dyn ToolService>, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    pub async fn resolve(&self) -> ToolCatalog {
        let started = Instant::now();

        let catalog = match with_deadline(self.timeout, "tools/list", self.tools.list_tools()).await
        {
            Ok(Ok(descriptors)) => ToolCatalog::from_descriptors(descriptors),
            Ok(Err(e)) => ToolCatalog::unavailable(e.to_string()),
            Err(deadline) => ToolCatalog::unavailable(deadline.to_string()),
        };

        match &catalog {
            ToolCatalog::Available(tools) => tracing::info!(
                tool_count = tools.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "tool catalog resolved"
            ),
            ToolCatalog::Unavailable { reason } => tracing::warn!(
                reason = %reason,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "tool catalog unavailable, continuing without tools"
            ),
        }

        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mcp::{MockToolService, UnconfiguredToolService};
    use crate::domain::diagnosis::ToolDescriptor;
    use crate::ports::ToolServiceError;

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "desc", serde_json::json!({"type": "object"}))
    }

    #[tokio::test]
    async fn available_when_service_lists_tools() {
        let service = MockToolService::new().with_tool(tool("get_tree")).with_tool(tool("get_logs"));
        let resolver = CatalogResolver::new(Arc::new(service), Duration::from_secs(1));

        let catalog = resolver.resolve().await;

        assert!(catalog.is_available());
        assert_eq!(catalog.tools().len(), 2);
    }

    #[tokio::test]
    async fn unavailable_on_connection_failure() {
        let service = MockToolService::new().with_list_error(ToolServiceError::connection("refused"));
        let resolver = CatalogResolver::new(Arc::new(service), Duration::from_secs(1));

        let catalog = resolver.resolve().await;

        assert_eq!(
            catalog.unavailable_reason(),
            Some("connection failed: refused")
        );
    }

    #[tokio::test]
    async fn unavailable_on_timeout() {
        let service = MockToolService::new()
            .with_tool(tool("get_tree"))
            .with_list_delay(Duration::from_millis(500));
        let resolver = CatalogResolver::new(Arc::new(service), Duration::from_millis(20));

        let catalog = resolver.resolve().await;

        assert!(!catalog.is_available());
        assert!(catalog.unavailable_reason().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn unavailable_when_no_tools_advertised() {
        let resolver = CatalogResolver::new(Arc::new(MockToolService::new()), Duration::from_secs(1));

        assert!(!resolver.resolve().await.is_available());
    }

    #[tokio::test]
    async fn unavailable_when_not_configured() {
        let resolver = CatalogResolver::new(Arc::new(UnconfiguredToolService), Duration::from_secs(1));

        let catalog = resolver.resolve().await;

        assert_eq!(
            catalog.unavailable_reason(),
            Some("tool service is not configured")
        );
    }
}
