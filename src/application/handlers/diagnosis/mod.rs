//! Diagnosis handlers.
//!
//! - `DiagnoseIssueHandler` - catalog resolution followed by the bounded tool loop
//! - `SingleShotDiagnoseHandler` - one default-tool lookup, one model call
//! - `CatalogResolver` / `ConversationDriver` - the two components of the agentic flow

mod diagnose_issue;
mod resolve_catalog;
mod run_conversation;
mod settings;
mod single_shot;

pub use diagnose_issue::{DiagnoseError, DiagnoseIssueCommand, DiagnoseIssueHandler};
pub use resolve_catalog::CatalogResolver;
pub use run_conversation::{ConversationDriver, DriverError};
pub use settings::DiagnosisSettings;
pub use single_shot::SingleShotDiagnoseHandler;
