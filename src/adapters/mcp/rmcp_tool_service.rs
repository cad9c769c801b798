//! MCP Tool Service - Implementation of ToolService over MCP streamable HTTP.
//!
//! Every operation opens its own session: handshake, one request, close. No
//! session outlives the call that created it, so a request never observes
//! state left behind by another.
//!
//! # Configuration
//!
//! ```ignore
//! let config = McpClientConfig::new("https://mcp.example.com/mcp")
//!     .with_token(token)
//!     .with_client_name("buildprint-runner");
//!
//! let tools = McpToolService::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ClientCapabilities, ClientInfo, Content, Implementation,
    PaginatedRequestParam, ProtocolVersion, RawContent,
};
use rmcp::service::RunningService;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::{ClientHandler, RoleClient};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

use crate::domain::diagnosis::ToolDescriptor;
use crate::ports::{ToolOutput, ToolService, ToolServiceError};

/// Upper bound on `tools/list` pages followed in one listing.
const MAX_LIST_PAGES: usize = 50;

/// Configuration for the MCP client.
#[derive(Debug, Clone)]
pub struct McpClientConfig {
    /// Streamable HTTP endpoint of the tool service.
    pub url: String,
    /// Bearer token, if the service requires one.
    token: Option<Secret<String>>,
    /// Name reported during the handshake.
    pub client_name: String,
    /// Version reported during the handshake.
    pub client_version: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl McpClientConfig {
    /// Creates a new configuration for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            client_name: "buildprint-runner".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Secret::new(token.into()));
        self
    }

    /// Sets the client name reported to the server.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn authorization_value(&self) -> Option<String> {
        let token = self.token.as_ref()?.expose_secret().trim();
        if token.is_empty() {
            return None;
        }
        if token.to_ascii_lowercase().starts_with("bearer ") {
            Some(token.to_string())
        } else {
            Some(format!("Bearer {}", token))
        }
    }
}

#[derive(Clone)]
struct RunnerClientHandler {
    info: ClientInfo,
}

impl ClientHandler for RunnerClientHandler {
    fn get_info(&self) -> ClientInfo {
        self.info.clone()
    }
}

type McpSession = RunningService<RoleClient, RunnerClientHandler>;

/// Tool service backed by a remote MCP server.
pub struct McpToolService {
    config: McpClientConfig,
    client: reqwest::Client,
}

impl McpToolService {
    /// Creates a new MCP tool service.
    pub fn new(config: McpClientConfig) -> Result<Self, ToolServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("{}/{}", config.client_name, config.client_version))
                .map_err(|e| ToolServiceError::connection(format!("invalid client name: {}", e)))?,
        );
        if let Some(value) = config.authorization_value() {
            let mut value = HeaderValue::from_str(&value)
                .map_err(|e| ToolServiceError::connection(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ToolServiceError::connection(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn client_info(&self) -> ClientInfo {
        ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: self.config.client_name.clone(),
                title: None,
                version: self.config.client_version.clone(),
                icons: None,
                website_url: None,
            },
        }
    }

    /// Opens a session and completes the MCP handshake.
    async fn connect(&self) -> Result<McpSession, ToolServiceError> {
        let transport = StreamableHttpClientTransport::with_client(
            self.client.clone(),
            StreamableHttpClientTransportConfig::with_uri(self.config.url.clone()),
        );
        let handler = RunnerClientHandler {
            info: self.client_info(),
        };

        rmcp::serve_client(handler, transport)
            .await
            .map_err(|e| ToolServiceError::connection(format!("handshake failed: {}", e)))
    }

    /// Closes a session; close failures are logged, never surfaced.
    async fn close(&self, session: McpSession) {
        if let Err(e) = session.cancel().await {
            tracing::debug!(error = %e, url = %self.config.url, "MCP session close failed");
        }
    }

    async fn list_all(session: &McpSession) -> Result<Vec<ToolDescriptor>, ToolServiceError> {
        let mut descriptors = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let page = session
                .peer()
                .list_tools(Some(PaginatedRequestParam {
                    cursor: cursor.clone(),
                }))
                .await
                .map_err(|e| ToolServiceError::protocol(format!("tools/list failed: {}", e)))?;

            descriptors.extend(page.tools.into_iter().map(map_tool));

            match page.next_cursor {
                Some(next) if Some(&next) != cursor.as_ref() => cursor = Some(next),
                _ => return Ok(descriptors),
            }
        }

        tracing::warn!(pages = MAX_LIST_PAGES, "tools/list pagination cut short");
        Ok(descriptors)
    }
}

#[async_trait]
impl ToolService for McpToolService {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServiceError> {
        let session = self.connect().await?;
        let result = Self::list_all(&session).await;
        self.close(session).await;
        result
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, ToolServiceError> {
        let arguments = match arguments {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                return Err(ToolServiceError::invalid_arguments(
                    name,
                    format!("expected a JSON object, got {}", other),
                ))
            }
        };

        let session = self.connect().await?;
        let result = session
            .peer()
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments,
            })
            .await
            .map_err(|e| ToolServiceError::protocol(format!("tools/call failed: {}", e)));
        self.close(session).await;

        Ok(map_tool_result(result?))
    }
}

fn map_tool(tool: rmcp::model::Tool) -> ToolDescriptor {
    ToolDescriptor::new(
        tool.name.to_string(),
        tool.description.map(|d| d.to_string()).unwrap_or_default(),
        serde_json::Value::Object((*tool.input_schema).clone()),
    )
}

/// Flattens a tool result to text: text parts joined by newlines, other parts
/// as JSON, structured content when nothing else was returned.
fn map_tool_result(result: CallToolResult) -> ToolOutput {
    let mut parts: Vec<String> = result.content.into_iter().map(content_text).collect();

    if parts.is_empty() {
        if let Some(value) = result.structured_content {
            parts.push(value.to_string());
        }
    }

    ToolOutput {
        content: parts.join("\n"),
        is_error: result.is_error.unwrap_or(false),
    }
}

fn content_text(content: Content) -> String {
    match content.raw {
        RawContent::Text(text) => text.text,
        other => serde_json::to_string(&other).unwrap_or_else(|_| "[unsupported content]".to_string()),
    }
}
