//! Tool Service Port - Interface for the external tool-execution service.
//!
//! The diagnosis loop lists the tools a service advertises and invokes them on
//! the model's behalf. Each operation is one-shot: implementations open a
//! connection, perform the operation and close the connection before
//! returning, on success and on failure alike.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use buildprint_runner::ports::{ToolOutput, ToolService, ToolServiceError};
//!
//! struct StaticTools;
//!
//! #[async_trait]
//! impl ToolService for StaticTools {
//!     async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServiceError> {
//!         Ok(vec![])
//!     }
//!
//!     async fn invoke(
//!         &self,
//!         name: &str,
//!         arguments: serde_json::Value,
//!     ) -> Result<ToolOutput, ToolServiceError> {
//!         Err(ToolServiceError::unknown_tool(name))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::diagnosis::ToolDescriptor;

/// Port for the tool-execution service.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// List every tool the service advertises, following pagination.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServiceError>;

    /// Invoke a tool by name with JSON arguments.
    ///
    /// # Returns
    ///
    /// * `Ok(ToolOutput)` - The service answered (check `is_error` for the tool's own verdict)
    /// * `Err(ToolServiceError)` - The call could not be completed
    async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, ToolServiceError>;
}

/// Output of a tool invocation, flattened to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    /// Creates a successful output.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Creates an output the tool itself flagged as an error.
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Errors from the tool service.
#[derive(Debug, Clone, Error)]
pub enum ToolServiceError {
    /// No tool service endpoint is configured.
    #[error("tool service is not configured")]
    NotConfigured,

    /// Could not connect or the connection dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The service answered with something we could not use.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Arguments were not a JSON object.
    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Tool not found.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolServiceError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Creates an invalid arguments error.
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown tool error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }
}
