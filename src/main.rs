//! Buildprint Runner server entry point

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use buildprint_runner::adapters::ai::{AnthropicConfig, AnthropicProvider};
use buildprint_runner::adapters::http::{build_app, DiagnosisAppState};
use buildprint_runner::adapters::mcp::{McpClientConfig, McpToolService, UnconfiguredToolService};
use buildprint_runner::config::AppConfig;
use buildprint_runner::ports::{AIProvider, ToolService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let ai_provider = build_ai_provider(&config)?;
    let tool_service = build_tool_service(&config)?;
    let settings = config.diagnosis_settings();

    let provider = ai_provider.provider_info();
    tracing::info!(
        provider = %provider.name,
        model = %provider.model,
        mcp_configured = config.mcp.endpoint().is_some(),
        max_iterations = settings.max_iterations,
        "configuration loaded"
    );

    let state = DiagnosisAppState::new(ai_provider, tool_service, settings);
    let app = build_app(state, &config.server.cors_origins_list());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "buildprint runner listening");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn build_ai_provider(config: &AppConfig) -> Result<Arc<dyn AIProvider>, Box<dyn Error>> {
    let api_key = config.ai.anthropic_api_key.clone().unwrap_or_default();
    let anthropic = AnthropicConfig::new(api_key)
        .with_model(config.ai.model.clone())
        .with_base_url(config.ai.base_url.clone())
        .with_max_tokens(config.ai.max_tokens)
        .with_timeout(Duration::from_secs(config.agent.model_timeout_secs));
    Ok(Arc::new(AnthropicProvider::new(anthropic)?))
}

fn build_tool_service(config: &AppConfig) -> Result<Arc<dyn ToolService>, Box<dyn Error>> {
    let Some(url) = config.mcp.endpoint() else {
        tracing::warn!("no MCP url configured, diagnoses will run without tools");
        return Ok(Arc::new(UnconfiguredToolService));
    };

    let mut mcp = McpClientConfig::new(url).with_client_name(config.mcp.client_name.clone());
    if let Some(token) = config.mcp.token.as_deref().filter(|t| !t.trim().is_empty()) {
        mcp = mcp.with_token(token);
    }
    Ok(Arc::new(McpToolService::new(mcp)?))
}
