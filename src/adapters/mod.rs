//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `ai` - Model providers (Anthropic, mock)
//! - `mcp` - Tool services (MCP over streamable HTTP, mock, unconfigured)
//! - `http` - Axum REST surface

pub mod ai;
pub mod http;
pub mod mcp;

pub use ai::{AnthropicConfig, AnthropicProvider, MockAIProvider};
pub use http::{build_app, diagnosis_router, DiagnosisAppState};
pub use mcp::{McpClientConfig, McpToolService, MockToolService, UnconfiguredToolService};
