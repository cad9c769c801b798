//! Conversation - ordered, append-only turns exchanged with the model.
//!
//! The conversation enforces two rules while it grows:
//!
//! - roles alternate, starting with the seeded user turn
//! - every assistant tool-use block is answered in the very next user turn
//!   by exactly one tool-result block carrying the same identifier, in
//!   request order

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::invocation::{ToolInvocationRequest, ToolInvocationResult};

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of a structured turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text { text: String },
    ToolUse(ToolInvocationRequest),
    ToolResult(ToolInvocationResult),
}

impl ContentBlock {
    /// Creates a text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolInvocationRequest> {
        match self {
            Self::ToolUse(request) => Some(request),
            _ => None,
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolInvocationResult> {
        match self {
            Self::ToolResult(result) => Some(result),
            _ => None,
        }
    }
}

/// Payload of a turn: plain text or a list of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A single turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: TurnContent,
}

impl Turn {
    /// Creates a plain-text user turn.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
        }
    }

    /// Creates an assistant turn from reply blocks.
    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Blocks(blocks),
        }
    }

    /// Creates a user turn holding tool results.
    pub fn tool_results(results: Vec<ToolInvocationResult>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Blocks(results.into_iter().map(ContentBlock::ToolResult).collect()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &TurnContent {
        &self.content
    }

    /// Returns the blocks (empty for plain-text turns).
    pub fn blocks(&self) -> &[ContentBlock] {
        match &self.content {
            TurnContent::Text(_) => &[],
            TurnContent::Blocks(blocks) => blocks,
        }
    }

    /// Returns the tool-use requests in block order.
    pub fn tool_requests(&self) -> Vec<&ToolInvocationRequest> {
        self.blocks().iter().filter_map(ContentBlock::as_tool_use).collect()
    }

    /// Returns the tool results in block order.
    pub fn tool_results_in_turn(&self) -> Vec<&ToolInvocationResult> {
        self.blocks().iter().filter_map(ContentBlock::as_tool_result).collect()
    }
}

/// Errors raised when an append would break the conversation rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("expected a {expected:?} turn next, got {actual:?}")]
    RoleOutOfOrder { expected: Role, actual: Role },

    #[error("no pending tool requests to answer")]
    NoPendingToolRequests,

    #[error("tool result count mismatch: {expected} requested, {actual} answered")]
    ResultCountMismatch { expected: usize, actual: usize },

    #[error("tool result at position {position} answers '{actual}', expected '{expected}'")]
    ResultIdMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("tool request '{id}' in turn {turn} has no matching result")]
    UnansweredRequest { turn: usize, id: String },
}

/// Append-only conversation owned by a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Starts a conversation with the rendered task as the first user turn.
    pub fn seeded(task: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user_text(task)],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn next_role(&self) -> Role {
        match self.turns.last().map(Turn::role) {
            Some(Role::User) => Role::Assistant,
            _ => Role::User,
        }
    }

    /// Appends a model reply verbatim as an assistant turn.
    pub fn push_assistant(&mut self, blocks: Vec<ContentBlock>) -> Result<(), ConversationError> {
        let expected = self.next_role();
        if expected != Role::Assistant {
            return Err(ConversationError::RoleOutOfOrder {
                expected,
                actual: Role::Assistant,
            });
        }
        self.turns.push(Turn::assistant(blocks));
        Ok(())
    }

    /// Tool requests of the last assistant turn that still await results.
    pub fn pending_tool_requests(&self) -> Vec<&ToolInvocationRequest> {
        match self.turns.last() {
            Some(turn) if turn.role() == Role::Assistant => turn.tool_requests(),
            _ => Vec::new(),
        }
    }

    /// Appends one user turn answering every pending tool request.
    ///
    /// Results must be given in request order, one per request.
    pub fn push_tool_results(
        &mut self,
        results: Vec<ToolInvocationResult>,
    ) -> Result<(), ConversationError> {
        let pending = self.pending_tool_requests();
        if pending.is_empty() {
            return Err(ConversationError::NoPendingToolRequests);
        }
        if pending.len() != results.len() {
            return Err(ConversationError::ResultCountMismatch {
                expected: pending.len(),
                actual: results.len(),
            });
        }
        for (position, (request, result)) in pending.iter().zip(&results).enumerate() {
            if request.id() != result.tool_use_id() {
                return Err(ConversationError::ResultIdMismatch {
                    position,
                    expected: request.id().to_string(),
                    actual: result.tool_use_id().to_string(),
                });
            }
        }

        self.turns.push(Turn::tool_results(results));
        Ok(())
    }

    /// Checks that every tool request has exactly one matching result in the
    /// following turn.
    pub fn verify_pairing(&self) -> Result<(), ConversationError> {
        for (index, turn) in self.turns.iter().enumerate() {
            if turn.role() != Role::Assistant {
                continue;
            }
            let requests = turn.tool_requests();
            if requests.is_empty() {
                continue;
            }
            let answers = self
                .turns
                .get(index + 1)
                .map(Turn::tool_results_in_turn)
                .unwrap_or_default();

            for request in &requests {
                let matches = answers
                    .iter()
                    .filter(|r| r.tool_use_id() == request.id())
                    .count();
                if matches != 1 {
                    return Err(ConversationError::UnansweredRequest {
                        turn: index,
                        id: request.id().to_string(),
                    });
                }
            }
            if answers.len() != requests.len() {
                return Err(ConversationError::ResultCountMismatch {
                    expected: requests.len(),
                    actual: answers.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tool_use(id: &str) -> ContentBlock {
        ContentBlock::ToolUse(ToolInvocationRequest::new(
            id,
            "get_tree",
            serde_json::json!({"page": "profile"}),
        ))
    }

    #[test]
    fn seeded_starts_with_user_text() {
        let conversation = Conversation::seeded("Diagnose this");

        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0].role(), Role::User);
        assert_eq!(
            conversation.turns()[0].content(),
            &TurnContent::Text("Diagnose this".to_string())
        );
    }

    #[test]
    fn assistant_then_results_keeps_pairing() {
        let mut conversation = Conversation::seeded("task");
        conversation
            .push_assistant(vec![ContentBlock::text("Looking"), tool_use("a"), tool_use("b")])
            .unwrap();

        assert_eq!(conversation.pending_tool_requests().len(), 2);

        conversation
            .push_tool_results(vec![
                ToolInvocationResult::success("a", "ok"),
                ToolInvocationResult::failure("b", "boom"),
            ])
            .unwrap();

        assert_eq!(conversation.len(), 3);
        assert!(conversation.pending_tool_requests().is_empty());
        assert!(conversation.verify_pairing().is_ok());
    }

    #[test]
    fn assistant_twice_is_rejected() {
        let mut conversation = Conversation::seeded("task");
        conversation.push_assistant(vec![ContentBlock::text("hi")]).unwrap();

        let err = conversation
            .push_assistant(vec![ContentBlock::text("again")])
            .unwrap_err();
        assert!(matches!(err, ConversationError::RoleOutOfOrder { .. }));
    }

    #[test]
    fn results_without_requests_are_rejected() {
        let mut conversation = Conversation::seeded("task");

        let err = conversation
            .push_tool_results(vec![ToolInvocationResult::success("a", "ok")])
            .unwrap_err();
        assert_eq!(err, ConversationError::NoPendingToolRequests);
    }

    #[test]
    fn results_out_of_order_are_rejected() {
        let mut conversation = Conversation::seeded("task");
        conversation.push_assistant(vec![tool_use("a"), tool_use("b")]).unwrap();

        let err = conversation
            .push_tool_results(vec![
                ToolInvocationResult::success("b", "ok"),
                ToolInvocationResult::success("a", "ok"),
            ])
            .unwrap_err();
        assert!(matches!(err, ConversationError::ResultIdMismatch { position: 0, .. }));
    }

    #[test]
    fn missing_result_is_rejected() {
        let mut conversation = Conversation::seeded("task");
        conversation.push_assistant(vec![tool_use("a"), tool_use("b")]).unwrap();

        let err = conversation
            .push_tool_results(vec![ToolInvocationResult::success("a", "ok")])
            .unwrap_err();
        assert_eq!(
            err,
            ConversationError::ResultCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn verify_pairing_flags_trailing_requests() {
        let mut conversation = Conversation::seeded("task");
        conversation.push_assistant(vec![tool_use("a")]).unwrap();

        let err = conversation.verify_pairing().unwrap_err();
        assert!(matches!(err, ConversationError::UnansweredRequest { turn: 1, .. }));
    }

    proptest! {
        #[test]
        fn every_request_round_is_answered(rounds in proptest::collection::vec(1usize..5, 0..6)) {
            let mut conversation = Conversation::seeded("task");

            for (round, count) in rounds.iter().enumerate() {
                let blocks: Vec<ContentBlock> = (0..*count)
                    .map(|i| tool_use(&format!("r{}-{}", round, i)))
                    .collect();
                conversation.push_assistant(blocks).unwrap();

                let results: Vec<ToolInvocationResult> = conversation
                    .pending_tool_requests()
                    .iter()
                    .map(|r| ToolInvocationResult::success(r.id(), "done"))
                    .collect();
                conversation.push_tool_results(results).unwrap();
            }

            prop_assert!(conversation.verify_pairing().is_ok());
            prop_assert_eq!(conversation.len(), 1 + rounds.len() * 2);
        }
    }
}
