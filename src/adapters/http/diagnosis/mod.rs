//! Diagnosis HTTP adapter.
//!
//! Provides endpoints for:
//! - Running the agentic and single-shot diagnosis flows
//! - Inspecting the tool catalog
//! - Health checks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, RunMetadata, RunRequest, RunResponse, ToolsResponse};
pub use handlers::{DiagnosisApiError, DiagnosisAppState};
pub use routes::{diagnosis_router, diagnosis_routes};
