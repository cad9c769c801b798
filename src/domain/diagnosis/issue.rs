//! Issue report - the immutable input of a diagnosis run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// A support issue submitted for diagnosis.
///
/// Only used to seed the first user turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    title: String,
    description: String,
    labels: Vec<String>,
    comments: Vec<IssueComment>,
    issue_id: Option<IssueId>,
}

/// A single entry of the issue's comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueComment {
    /// Bare comment text.
    Plain(String),
    /// Comment with an optional author.
    Authored {
        #[serde(default)]
        author: Option<String>,
        body: String,
    },
}

/// External identifier of the issue (tracker ids are strings or integers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueId {
    Number(i64),
    Text(String),
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueId::Number(n) => write!(f, "{}", n),
            IssueId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl IssueComment {
    /// Returns the comment body.
    pub fn body(&self) -> &str {
        match self {
            IssueComment::Plain(body) => body,
            IssueComment::Authored { body, .. } => body,
        }
    }

    /// Returns the author, if known.
    pub fn author(&self) -> Option<&str> {
        match self {
            IssueComment::Plain(_) => None,
            IssueComment::Authored { author, .. } => author.as_deref(),
        }
    }
}

impl IssueReport {
    /// Creates a new issue report.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` when both title and description
    /// are blank; there is nothing to diagnose in that case.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into().trim().to_string();
        let description = description.into().trim().to_string();

        if title.is_empty() && description.is_empty() {
            return Err(ValidationError::empty_field("taskTitle"));
        }

        Ok(Self {
            title,
            description,
            labels: Vec::new(),
            comments: Vec::new(),
            issue_id: None,
        })
    }

    /// Sets the labels, dropping blank ones.
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.labels = labels
            .into_iter()
            .map(Into::into)
            .map(|l: String| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        self
    }

    /// Sets the comment thread, dropping comments with a blank body.
    pub fn with_comments(mut self, comments: impl IntoIterator<Item = IssueComment>) -> Self {
        self.comments = comments
            .into_iter()
            .filter(|c| !c.body().trim().is_empty())
            .collect();
        self
    }

    /// Sets the external issue identifier.
    pub fn with_issue_id(mut self, issue_id: IssueId) -> Self {
        self.issue_id = Some(issue_id);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn comments(&self) -> &[IssueComment] {
        &self.comments
    }

    pub fn issue_id(&self) -> Option<&IssueId> {
        self.issue_id.as_ref()
    }

    /// Renders the issue as tool arguments for single-shot lookups.
    pub fn to_tool_arguments(&self) -> serde_json::Value {
        let mut args = serde_json::json!({
            "title": self.title,
            "description": self.description,
            "labels": self.labels,
        });
        if let Some(id) = &self.issue_id {
            args["issueId"] = serde_json::Value::String(id.to_string());
        }
        args
    }
}
