//! Tool Service Adapters.
//!
//! ## Available Adapters
//!
//! - `McpToolService` - Remote MCP server over streamable HTTP
//! - `UnconfiguredToolService` - Stand-in when no MCP endpoint is set
//! - `MockToolService` - Configurable mock for testing

mod mock_tool_service;
mod rmcp_tool_service;
mod unconfigured;

pub use mock_tool_service::{MockToolBehavior, MockToolService, RecordedCall};
pub use rmcp_tool_service::{McpClientConfig, McpToolService};
pub use unconfigured::UnconfiguredToolService;
