//! Diagnosis domain - issue reports, tool catalogs and the conversation
//! exchanged with the model while diagnosing them.

mod catalog;
mod conversation;
mod invocation;
mod issue;
mod outcome;
pub mod prompts;

pub use catalog::{ToolCatalog, ToolDescriptor};
pub use conversation::{ContentBlock, Conversation, ConversationError, Role, Turn, TurnContent};
pub use invocation::{ToolInvocationRequest, ToolInvocationResult};
pub use issue::{IssueComment, IssueId, IssueReport};
pub use outcome::{LoopOutcome, Termination};
