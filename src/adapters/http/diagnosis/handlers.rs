//! HTTP handlers for diagnosis endpoints.
//!
//! These handlers connect Axum routes to the diagnosis command handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::handlers::diagnosis::{
    CatalogResolver, DiagnoseError, DiagnoseIssueCommand, DiagnoseIssueHandler,
    DiagnosisSettings, SingleShotDiagnoseHandler,
};
use crate::domain::foundation::{ErrorCode, ValidationError};
use crate::ports::{AIError, AIProvider, ToolService};

use super::dto::{ErrorResponse, HealthResponse, RunRequest, RunResponse, ToolsResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for diagnosis endpoints.
///
/// Cloned for each request; handlers are built on demand from the
/// Arc-wrapped dependencies.
#[derive(Clone)]
pub struct DiagnosisAppState {
    pub ai_provider: Arc<dyn AIProvider>,
    pub tool_service: Arc<dyn ToolService>,
    pub settings: DiagnosisSettings,
}

impl DiagnosisAppState {
    pub fn new(
        ai_provider: Arc<dyn AIProvider>,
        tool_service: Arc<dyn ToolService>,
        settings: DiagnosisSettings,
    ) -> Self {
        Self {
            ai_provider,
            tool_service,
            settings,
        }
    }

    pub fn diagnose_handler(&self) -> DiagnoseIssueHandler {
        DiagnoseIssueHandler::new(
            self.ai_provider.clone(),
            self.tool_service.clone(),
            self.settings.clone(),
        )
    }

    pub fn single_shot_handler(&self) -> SingleShotDiagnoseHandler {
        SingleShotDiagnoseHandler::new(
            self.ai_provider.clone(),
            self.tool_service.clone(),
            self.settings.clone(),
        )
    }

    pub fn catalog_resolver(&self) -> CatalogResolver {
        CatalogResolver::new(self.tool_service.clone(), self.settings.catalog_timeout)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET / - Health check
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// POST /run - Agentic diagnosis with the tool loop
pub async fn run_diagnosis(
    State(state): State<DiagnosisAppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DiagnosisApiError> {
    let Json(request) = payload?;
    let cmd = DiagnoseIssueCommand {
        issue: request.into_issue()?,
    };

    let outcome = state.diagnose_handler().handle(cmd).await?;

    Ok(Json(RunResponse::from(outcome)))
}

/// POST /run/single - One context lookup, one model call
pub async fn run_single_shot(
    State(state): State<DiagnosisAppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<impl IntoResponse, DiagnosisApiError> {
    let Json(request) = payload?;
    let cmd = DiagnoseIssueCommand {
        issue: request.into_issue()?,
    };

    let outcome = state.single_shot_handler().handle(cmd).await?;

    Ok(Json(RunResponse::from(outcome)))
}

/// GET /tools - Resolve and report the tool catalog
pub async fn list_tools(State(state): State<DiagnosisAppState>) -> impl IntoResponse {
    let catalog = state.catalog_resolver().resolve().await;
    Json(ToolsResponse::from(&catalog))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts request and run errors to HTTP responses.
#[derive(Debug)]
pub enum DiagnosisApiError {
    Malformed(String),
    Invalid(ValidationError),
    Run(DiagnoseError),
}

impl From<JsonRejection> for DiagnosisApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl From<ValidationError> for DiagnosisApiError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

impl From<DiagnoseError> for DiagnosisApiError {
    fn from(err: DiagnoseError) -> Self {
        Self::Run(err)
    }
}

impl DiagnosisApiError {
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            Self::Malformed(_) => (StatusCode::BAD_REQUEST, ErrorCode::MalformedRequest),
            Self::Invalid(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed),
            Self::Run(DiagnoseError::Model(e)) if e.is_timeout() => {
                (StatusCode::GATEWAY_TIMEOUT, ErrorCode::ModelTimeout)
            }
            Self::Run(DiagnoseError::Model(AIError::RateLimited { .. })) => {
                (StatusCode::BAD_GATEWAY, ErrorCode::RateLimited)
            }
            Self::Run(DiagnoseError::Model(_)) => {
                (StatusCode::BAD_GATEWAY, ErrorCode::ModelUnavailable)
            }
            Self::Run(DiagnoseError::Internal(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError)
            }
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Malformed(detail) => format!("malformed request body: {detail}"),
            Self::Invalid(err) => err.to_string(),
            Self::Run(err) => err.to_string(),
        }
    }
}

impl IntoResponse for DiagnosisApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(%status, error = %code, message = %self.message(), "diagnosis request failed");
        } else {
            tracing::debug!(%status, error = %code, message = %self.message(), "diagnosis request rejected");
        }
        (status, Json(ErrorResponse::new(code.to_string(), self.message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn model_timeout_maps_to_gateway_timeout() {
        let err = DiagnosisApiError::Run(DiagnoseError::Model(AIError::timeout(Duration::from_secs(90))));
        assert_eq!(err.status_and_code(), (StatusCode::GATEWAY_TIMEOUT, ErrorCode::ModelTimeout));
    }

    #[test]
    fn model_failures_map_to_bad_gateway() {
        let auth = DiagnosisApiError::Run(DiagnoseError::Model(AIError::AuthenticationFailed));
        assert_eq!(auth.status_and_code().0, StatusCode::BAD_GATEWAY);

        let limited = DiagnosisApiError::Run(DiagnoseError::Model(AIError::RateLimited {
            retry_after_secs: 30,
        }));
        assert_eq!(limited.status_and_code(), (StatusCode::BAD_GATEWAY, ErrorCode::RateLimited));
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = DiagnosisApiError::from(ValidationError::empty_field("taskTitle"));
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed));
        assert!(err.message().contains("taskTitle"));
    }

    #[test]
    fn internal_maps_to_server_error() {
        let err = DiagnosisApiError::Run(DiagnoseError::Internal("bad pairing".to_string()));
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
