//! HTTP adapters - REST API implementations.

pub mod diagnosis;
pub mod server;

pub use diagnosis::{diagnosis_router, DiagnosisAppState};
pub use server::{build_app, cors_layer};
