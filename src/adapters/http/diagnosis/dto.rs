//! HTTP DTOs for diagnosis endpoints.
//!
//! Request bodies use camelCase keys; response metadata keeps snake_case keys
//! for compatibility with existing callers.

use serde::{Deserialize, Serialize};

use crate::domain::diagnosis::{IssueComment, IssueId, IssueReport, LoopOutcome, ToolCatalog, ToolDescriptor};
use crate::domain::foundation::ValidationError;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to diagnose a support issue.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default)]
    pub task_title: String,
    #[serde(default)]
    pub task_description: String,
    #[serde(default)]
    pub comments: Option<Vec<IssueComment>>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub issue_id: Option<IssueId>,
}

impl RunRequest {
    /// Converts the body into a validated issue.
    pub fn into_issue(self) -> Result<IssueReport, ValidationError> {
        let mut issue = IssueReport::new(self.task_title, self.task_description)?
            .with_labels(self.labels.unwrap_or_default())
            .with_comments(self.comments.unwrap_or_default());
        if let Some(id) = self.issue_id {
            issue = issue.with_issue_id(id);
        }
        Ok(issue)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Run metadata returned with every answer.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub iterations: u32,
    pub mcp_available: bool,
    pub tools_used: Vec<String>,
}

/// Successful diagnosis.
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub ok: bool,
    pub response: String,
    pub metadata: RunMetadata,
}

impl From<LoopOutcome> for RunResponse {
    fn from(outcome: LoopOutcome) -> Self {
        Self {
            ok: true,
            response: outcome.answer,
            metadata: RunMetadata {
                iterations: outcome.iterations,
                mcp_available: outcome.mcp_available,
                tools_used: outcome.tools_used,
            },
        }
    }
}

/// Failure envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Health check body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// One advertised tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl From<&ToolDescriptor> for ToolSummary {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema().clone(),
        }
    }
}

/// Catalog inspection result.
#[derive(Debug, Clone, Serialize)]
pub struct ToolsResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub count: usize,
    pub tools: Vec<ToolSummary>,
}

impl From<&ToolCatalog> for ToolsResponse {
    fn from(catalog: &ToolCatalog) -> Self {
        let tools: Vec<ToolSummary> = catalog.tools().iter().map(ToolSummary::from).collect();
        Self {
            available: catalog.is_available(),
            reason: catalog.unavailable_reason().map(String::from),
            count: tools.len(),
            tools,
        }
    }
}
