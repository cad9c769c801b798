//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Language-model service (conversation in, reply out)
//! - `ToolService` - Tool-execution service (list tools, invoke tool)

mod ai_provider;
mod tool_service;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, ProviderInfo, RequestMetadata,
    StopReason, TokenUsage,
};
pub use tool_service::{ToolOutput, ToolService, ToolServiceError};
