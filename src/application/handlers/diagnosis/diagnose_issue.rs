//! DiagnoseIssueHandler - Resolve the catalog, then run the tool loop.

use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use super::resolve_catalog::CatalogResolver;
use super::run_conversation::{ConversationDriver, DriverError};
use super::settings::DiagnosisSettings;
use crate::domain::diagnosis::{IssueReport, LoopOutcome};
use crate::domain::foundation::RunId;
use crate::ports::{AIError, AIProvider, ToolService};

/// Command to diagnose an issue.
#[derive(Debug, Clone)]
pub struct DiagnoseIssueCommand {
    pub issue: IssueReport,
}

/// Errors surfaced to callers of the diagnosis handlers.
#[derive(Debug, Error)]
pub enum DiagnoseError {
    /// The model service failed or timed out; no answer exists.
    #[error("{0}")]
    Model(AIError),

    /// A bug, not an external failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DriverError> for DiagnoseError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Model { source, .. } => DiagnoseError::Model(source),
            other => DiagnoseError::Internal(other.to_string()),
        }
    }
}

/// Handler for the agentic diagnosis flow.
pub struct DiagnoseIssueHandler {
    resolver: CatalogResolver,
    driver: ConversationDriver,
}

impl DiagnoseIssueHandler {
    pub fn new(
        ai_provider: Arc<dyn AIProvider>,
        tools: Arc<dyn ToolService>,
        settings: DiagnosisSettings,
    ) -> Self {
        Self {
            resolver: CatalogResolver::new(tools.clone(), settings.catalog_timeout),
            driver: ConversationDriver::new(ai_provider, tools, settings),
        }
    }

    pub async fn handle(&self, cmd: DiagnoseIssueCommand) -> Result<LoopOutcome, DiagnoseError> {
        let run_id = RunId::new();
        let span = tracing::info_span!("diagnose", %run_id);

        async move {
            tracing::info!(title = cmd.issue.title(), "diagnosis started");

            let catalog = self.resolver.resolve().await;
            let outcome = self.driver.run(run_id, &cmd.issue, &catalog).await;

            if let Err(e) = &outcome {
                tracing::error!(error = %e, "diagnosis failed");
            }
            outcome.map_err(DiagnoseError::from)
        }
        .instrument(span)
        .await
    }
}
