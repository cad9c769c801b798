//! Loop outcome - the result of one diagnosis run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model produced a final answer.
    Completed,
    /// The iteration ceiling was reached while tools were still requested.
    IterationCeiling,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Completed => write!(f, "completed"),
            Termination::IterationCeiling => write!(f, "iteration_ceiling"),
        }
    }
}

/// Final answer plus the metadata callers report back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopOutcome {
    pub answer: String,
    /// Model calls made, always at least one.
    pub iterations: u32,
    /// Whether the tool catalog (or default tool) was usable.
    pub mcp_available: bool,
    /// Tool names actually invoked, in dispatch order. Requests left
    /// outstanding at the iteration ceiling and requests for tools outside
    /// the catalog are not counted.
    pub tools_used: Vec<String>,
    pub termination: Termination,
}

impl LoopOutcome {
    pub fn hit_ceiling(&self) -> bool {
        self.termination == Termination::IterationCeiling
    }
}
