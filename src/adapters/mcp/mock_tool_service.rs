//! Mock Tool Service for testing.
//!
//! # Features
//!
//! - Scripted tool catalog
//! - Per-tool outputs, failures and delays
//! - Listing failures and delays for catalog testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let tools = MockToolService::new()
//!     .with_tool(ToolDescriptor::new("get_tree", "Page tree", schema))
//!     .with_output("get_tree", "<Page name=\"profile\"/>")
//!     .with_tool_delay("get_tree", Duration::from_millis(50));
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::diagnosis::ToolDescriptor;
use crate::ports::{ToolOutput, ToolService, ToolServiceError};

/// Scripted behavior of one tool.
#[derive(Debug, Clone)]
pub enum MockToolBehavior {
    /// Answer with this output.
    Output(ToolOutput),
    /// Fail the call.
    Fail(ToolServiceError),
}

/// A recorded tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Mock tool service for testing.
#[derive(Debug, Clone, Default)]
pub struct MockToolService {
    tools: Vec<ToolDescriptor>,
    behaviors: HashMap<String, MockToolBehavior>,
    delays: HashMap<String, Duration>,
    list_error: Option<ToolServiceError>,
    list_delay: Duration,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    list_calls: Arc<Mutex<usize>>,
}

impl MockToolService {
    /// Creates a mock with no tools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertises a tool.
    pub fn with_tool(mut self, tool: ToolDescriptor) -> Self {
        self.tools.push(tool);
        self
    }

    /// Sets the output returned by a tool.
    pub fn with_output(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.behaviors
            .insert(name.into(), MockToolBehavior::Output(ToolOutput::text(content)));
        self
    }

    /// Sets a tool to answer with its own error flag set.
    pub fn with_error_output(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.behaviors
            .insert(name.into(), MockToolBehavior::Output(ToolOutput::error(content)));
        self
    }

    /// Sets a tool call to fail.
    pub fn with_failure(mut self, name: impl Into<String>, error: ToolServiceError) -> Self {
        self.behaviors.insert(name.into(), MockToolBehavior::Fail(error));
        self
    }

    /// Delays a tool's answer.
    pub fn with_tool_delay(mut self, name: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(name.into(), delay);
        self
    }

    /// Makes listing fail.
    pub fn with_list_error(mut self, error: ToolServiceError) -> Self {
        self.list_error = Some(error);
        self
    }

    /// Delays listing.
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    /// Returns all recorded invocations.
    pub fn get_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the number of invocations.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns the number of listings.
    pub fn list_count(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl ToolService for MockToolService {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServiceError> {
        *self.list_calls.lock().unwrap() += 1;

        if !self.list_delay.is_zero() {
            sleep(self.list_delay).await;
        }

        match &self.list_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.tools.clone()),
        }
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, ToolServiceError> {
        self.calls.lock().unwrap().push(RecordedCall {
            name: name.to_string(),
            arguments,
        });

        if let Some(delay) = self.delays.get(name) {
            sleep(*delay).await;
        }

        match self.behaviors.get(name) {
            Some(MockToolBehavior::Output(output)) => Ok(output.clone()),
            Some(MockToolBehavior::Fail(err)) => Err(err.clone()),
            None if self.tools.iter().any(|t| t.name() == name) => {
                Ok(ToolOutput::text(format!("{} ok", name)))
            }
            None => Err(ToolServiceError::unknown_tool(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_tool() -> ToolDescriptor {
        ToolDescriptor::new("get_tree", "Page tree", serde_json::json!({"type": "object"}))
    }

    #[tokio::test]
    async fn lists_configured_tools() {
        let service = MockToolService::new().with_tool(tree_tool());

        let tools = service.list_tools().await.unwrap();

        assert_eq!(tools.len(), 1);
        assert_eq!(service.list_count(), 1);
    }

    #[tokio::test]
    async fn list_error_is_returned() {
        let service = MockToolService::new()
            .with_list_error(ToolServiceError::connection("refused"));

        assert!(service.list_tools().await.is_err());
    }

    #[tokio::test]
    async fn invoke_returns_scripted_output_and_records_call() {
        let service = MockToolService::new()
            .with_tool(tree_tool())
            .with_output("get_tree", "<Page/>");

        let output = service
            .invoke("get_tree", serde_json::json!({"page": "profile"}))
            .await
            .unwrap();

        assert_eq!(output, ToolOutput::text("<Page/>"));
        assert_eq!(
            service.get_calls(),
            vec![RecordedCall {
                name: "get_tree".into(),
                arguments: serde_json::json!({"page": "profile"}),
            }]
        );
    }

    #[tokio::test]
    async fn invoke_unknown_tool_fails() {
        let service = MockToolService::new();

        let err = service.invoke("nope", serde_json::json!({})).await.unwrap_err();

        assert!(matches!(err, ToolServiceError::UnknownTool(_)));
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn advertised_tool_without_script_answers_default() {
        let service = MockToolService::new().with_tool(tree_tool());

        let output = service.invoke("get_tree", serde_json::json!({})).await.unwrap();

        assert_eq!(output.content, "get_tree ok");
    }
}
