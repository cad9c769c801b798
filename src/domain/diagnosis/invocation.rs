//! Tool invocation request and result types.
//!
//! A request is lifted from a model reply's tool-use block; a result answers
//! exactly one request by echoing its identifier.

use serde::{Deserialize, Serialize};

/// A request from the model to invoke a tool.
///
/// # Examples
///
/// ```ignore
/// use buildprint_runner::domain::diagnosis::ToolInvocationRequest;
///
/// let request = ToolInvocationRequest::new(
///     "toolu_01",
///     "get_tree",
///     serde_json::json!({ "page": "profile" }),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Identifier assigned by the model service
    id: String,

    /// Name of the tool to invoke
    name: String,

    /// Arguments for the tool (JSON object)
    input: serde_json::Value,
}

impl ToolInvocationRequest {
    /// Creates a new invocation request.
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &serde_json::Value {
        &self.input
    }
}

/// The outcome of one tool invocation, ready to be folded into the
/// conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    /// Identifier of the request this result answers
    tool_use_id: String,

    /// Output text (or the error message)
    content: String,

    /// Whether the invocation failed
    is_error: bool,
}

impl ToolInvocationResult {
    /// Creates a successful result.
    pub fn success(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Creates an error-flagged result carrying the failure message.
    pub fn failure(tool_use_id: impl Into<String>, message: impl AsRef<str>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: format!("Error: {}", message.as_ref()),
            is_error: true,
        }
    }

    /// Creates a result whose content came from the tool service as-is.
    ///
    /// Tool services may answer with an error flag and their own message; that
    /// message is passed through untouched.
    pub fn from_output(
        tool_use_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error,
        }
    }

    pub fn tool_use_id(&self) -> &str {
        &self.tool_use_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }
}
