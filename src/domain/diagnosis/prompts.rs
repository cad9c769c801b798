//! Prompt text for diagnosis runs.

use super::issue::IssueReport;

/// System instruction when contextual tools are offered.
pub const TOOLS_AVAILABLE_INSTRUCTION: &str = "You are a senior support engineer diagnosing \
issues in a web application built with a visual builder. You have tools that expose the \
application's structure, data and logs. Call them to gather evidence before you answer; \
prefer a few targeted calls over broad exploration. When you have enough evidence, answer \
with a diagnostic report: the most likely root cause, the evidence supporting it, concrete \
steps to fix it, and anything you could not verify.";

/// System instruction when the tool service could not be reached.
pub const TOOLS_UNAVAILABLE_INSTRUCTION: &str = "You are a senior support engineer diagnosing \
issues in a web application built with a visual builder. The contextual tools that normally \
expose the application's structure, data and logs are unavailable for this request, so you \
cannot inspect the application. Answer from the issue text alone with a diagnostic report: \
the most likely root causes ranked by likelihood, how to confirm each one, and suggested \
fixes. State clearly that your confidence is reduced because the application could not be \
inspected.";

/// System instruction when tool output was gathered up front and embedded in
/// the task.
pub const CONTEXT_PROVIDED_INSTRUCTION: &str = "You are a senior support engineer diagnosing \
issues in a web application built with a visual builder. Context gathered from the \
application is included after the issue. Base your answer on that context and answer with a \
diagnostic report: the most likely root cause, the evidence supporting it, concrete steps to \
fix it, and anything the context does not cover.";

/// Returns the system instruction for the given mode.
pub fn system_instruction(tools_available: bool) -> &'static str {
    if tools_available {
        TOOLS_AVAILABLE_INSTRUCTION
    } else {
        TOOLS_UNAVAILABLE_INSTRUCTION
    }
}

/// Renders the issue with the task template used for the first user turn.
pub fn render_task(issue: &IssueReport) -> String {
    let mut task = String::from("Diagnose the following support issue.\n\n");

    if let Some(id) = issue.issue_id() {
        task.push_str(&format!("Issue ID: {}\n", id));
    }
    task.push_str(&format!("Title: {}\n", or_placeholder(issue.title())));
    task.push_str(&format!(
        "Description:\n{}\n",
        or_placeholder(issue.description())
    ));

    if !issue.labels().is_empty() {
        task.push_str(&format!("Labels: {}\n", issue.labels().join(", ")));
    }

    if !issue.comments().is_empty() {
        task.push_str("\nComments:\n");
        for comment in issue.comments() {
            match comment.author() {
                Some(author) => task.push_str(&format!("- {}: {}\n", author, comment.body())),
                None => task.push_str(&format!("- {}\n", comment.body())),
            }
        }
    }

    task
}

/// Renders the task with tool output embedded as context (single-shot runs).
pub fn render_task_with_context(issue: &IssueReport, tool_name: &str, context: &str) -> String {
    format!(
        "{}\nContext returned by the `{}` tool:\n{}\n",
        render_task(issue),
        tool_name,
        context
    )
}

fn or_placeholder(text: &str) -> &str {
    if text.is_empty() {
        "(none provided)"
    } else {
        text
    }
}
