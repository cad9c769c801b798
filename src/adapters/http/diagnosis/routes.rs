//! Axum router configuration for diagnosis endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, list_tools, run_diagnosis, run_single_shot, DiagnosisAppState};

/// Create the diagnosis API router.
///
/// # Routes
///
/// - `GET /` - Health check
/// - `POST /run` - Diagnose an issue with the tool loop
/// - `POST /run/single` - Diagnose with one default-tool lookup
/// - `GET /tools` - Inspect the tool catalog
pub fn diagnosis_routes() -> Router<DiagnosisAppState> {
    Router::new()
        .route("/", get(health))
        .route("/run", post(run_diagnosis))
        .route("/run/single", post(run_single_shot))
        .route("/tools", get(list_tools))
}

/// Create the complete diagnosis router with its state applied.
///
/// # Example
///
/// ```ignore
/// let state = DiagnosisAppState::new(ai_provider, tool_service, settings);
/// let app = diagnosis_router(state);
/// ```
pub fn diagnosis_router(state: DiagnosisAppState) -> Router {
    diagnosis_routes().with_state(state)
}
