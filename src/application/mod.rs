//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod deadline;
pub mod handlers;

pub use deadline::{with_deadline, DeadlineExceeded};
pub use handlers::{
    CatalogResolver, ConversationDriver, DiagnoseError, DiagnoseIssueCommand,
    DiagnoseIssueHandler, DiagnosisSettings, DriverError, SingleShotDiagnoseHandler,
};
