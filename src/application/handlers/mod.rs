//! Application handlers.
//!
//! Command handlers that orchestrate domain operations across ports.

pub mod diagnosis;

pub use diagnosis::{
    CatalogResolver, ConversationDriver, DiagnoseError, DiagnoseIssueCommand,
    DiagnoseIssueHandler, DiagnosisSettings, DriverError, SingleShotDiagnoseHandler,
};
