//! SingleShotDiagnoseHandler - One context lookup, one model call.
//!
//! The default tool is invoked once with the issue as arguments and its
//! output is embedded in the task. The model is never offered tools, so the
//! run always takes exactly one iteration.

use std::sync::Arc;
use tracing::Instrument;

use super::diagnose_issue::{DiagnoseError, DiagnoseIssueCommand};
use super::settings::DiagnosisSettings;
use crate::application::deadline::with_deadline;
use crate::domain::diagnosis::{prompts, Conversation, IssueReport, LoopOutcome, Termination};
use crate::domain::foundation::RunId;
use crate::ports::{AIError, AIProvider, CompletionRequest, RequestMetadata, ToolService};

/// Handler for the non-agentic diagnosis flow.
pub struct SingleShotDiagnoseHandler {
    ai_provider: Arc<dyn AIProvider>,
    tools: Arc<dyn ToolService>,
    settings: DiagnosisSettings,
}

/// Context gathered before the model call.
struct GatheredContext {
    task: String,
    system_prompt: &'static str,
    tool: Option<String>,
}

impl SingleShotDiagnoseHandler {
    pub fn new(
        ai_provider: Arc<dyn AIProvider>,
        tools: Arc<dyn ToolService>,
        settings: DiagnosisSettings,
    ) -> Self {
        Self {
            ai_provider,
            tools,
            settings,
        }
    }

    pub async fn handle(&self, cmd: DiagnoseIssueCommand) -> Result<LoopOutcome, DiagnoseError> {
        let run_id = RunId::new();
        let span = tracing::info_span!("diagnose", %run_id, mode = "single");

        async move {
            let context = self.gather_context(&cmd.issue).await;

            let mut request = CompletionRequest::new(RequestMetadata::new(run_id, 1))
                .with_system_prompt(context.system_prompt)
                .with_messages(Conversation::seeded(context.task).turns().to_vec());
            if let Some(max_tokens) = self.settings.max_tokens {
                request = request.with_max_tokens(max_tokens);
            }

            let limit = self.settings.model_timeout;
            let reply = match with_deadline(limit, "model call", self.ai_provider.complete(request)).await {
                Ok(Ok(reply)) => reply,
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "single-shot model call failed");
                    return Err(DiagnoseError::Model(e));
                }
                Err(_) => {
                    tracing::error!(?limit, "single-shot model call timed out");
                    return Err(DiagnoseError::Model(AIError::timeout(limit)));
                }
            };

            tracing::info!(stop_reason = %reply.stop_reason, "single-shot diagnosis finished");

            let mcp_available = context.tool.is_some();
            Ok(LoopOutcome {
                answer: reply.text_content(),
                iterations: 1,
                mcp_available,
                tools_used: context.tool.into_iter().collect(),
                termination: Termination::Completed,
            })
        }
        .instrument(span)
        .await
    }

    /// Invokes the default tool; any failure falls back to the bare task.
    async fn gather_context(&self, issue: &IssueReport) -> GatheredContext {
        let degraded = || GatheredContext {
            task: prompts::render_task(issue),
            system_prompt: prompts::system_instruction(false),
            tool: None,
        };

        let Some(tool) = self.settings.default_tool.as_deref() else {
            tracing::info!("no default tool configured, running without context");
            return degraded();
        };

        let call = self.tools.invoke(tool, issue.to_tool_arguments());
        match with_deadline(self.settings.tool_timeout, "tool call", call).await {
            Ok(Ok(output)) if !output.is_error => GatheredContext {
                task: prompts::render_task_with_context(issue, tool, &output.content),
                system_prompt: prompts::CONTEXT_PROVIDED_INSTRUCTION,
                tool: Some(tool.to_string()),
            },
            Ok(Ok(output)) => {
                tracing::warn!(tool, message = %output.content, "default tool reported an error");
                degraded()
            }
            Ok(Err(e)) => {
                tracing::warn!(tool, error = %e, "default tool call failed");
                degraded()
            }
            Err(deadline) => {
                tracing::warn!(tool, error = %deadline, "default tool call timed out");
                degraded()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::mcp::MockToolService;
    use crate::domain::diagnosis::{IssueId, ToolDescriptor, TurnContent};
    use crate::ports::ToolServiceError;
    use std::time::Duration;

    fn command() -> DiagnoseIssueCommand {
        DiagnoseIssueCommand {
            issue: IssueReport::new("Button not saving", "Nothing happens")
                .unwrap()
                .with_issue_id(IssueId::Number(42)),
        }
    }

    fn context_tool() -> MockToolService {
        MockToolService::new().with_tool(ToolDescriptor::new(
            "get_context",
            "context",
            serde_json::json!({"type": "object"}),
        ))
    }

    fn first_message(ai: &MockAIProvider) -> String {
        match ai.get_calls()[0].messages[0].content() {
            TurnContent::Text(text) => text.clone(),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[tokio::test]
    async fn default_tool_output_is_embedded() {
        let ai = MockAIProvider::new().with_response("Diagnosis");
        let tools = context_tool().with_output("get_context", "workflow: save_profile (disabled)");
        let handler = SingleShotDiagnoseHandler::new(
            Arc::new(ai.clone()),
            Arc::new(tools.clone()),
            DiagnosisSettings::default().with_default_tool("get_context"),
        );

        let outcome = handler.handle(command()).await.unwrap();

        assert_eq!(outcome.answer, "Diagnosis");
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.mcp_available);
        assert_eq!(outcome.tools_used, vec!["get_context".to_string()]);

        let call = &tools.get_calls()[0];
        assert_eq!(call.arguments["title"], "Button not saving");
        assert_eq!(call.arguments["issueId"], "42");

        assert!(first_message(&ai).contains("save_profile (disabled)"));
        assert!(ai.get_calls()[0].tools.is_empty());
        assert_eq!(
            ai.get_calls()[0].system_prompt,
            prompts::CONTEXT_PROVIDED_INSTRUCTION
        );
    }

    #[tokio::test]
    async fn no_default_tool_runs_degraded() {
        let ai = MockAIProvider::new().with_response("Guess");
        let tools = context_tool();
        let handler = SingleShotDiagnoseHandler::new(
            Arc::new(ai.clone()),
            Arc::new(tools.clone()),
            DiagnosisSettings::default(),
        );

        let outcome = handler.handle(command()).await.unwrap();

        assert!(!outcome.mcp_available);
        assert!(outcome.tools_used.is_empty());
        assert_eq!(tools.call_count(), 0);
        assert!(ai.get_calls()[0].system_prompt.contains("unavailable"));
    }

    #[tokio::test]
    async fn failing_default_tool_runs_degraded() {
        let ai = MockAIProvider::new().with_response("Guess");
        let tools = context_tool().with_failure("get_context", ToolServiceError::connection("refused"));
        let handler = SingleShotDiagnoseHandler::new(
            Arc::new(ai.clone()),
            Arc::new(tools),
            DiagnosisSettings::default().with_default_tool("get_context"),
        );

        let outcome = handler.handle(command()).await.unwrap();

        assert!(!outcome.mcp_available);
        assert!(outcome.tools_used.is_empty());
        assert!(!first_message(&ai).contains("Context returned"));
    }

    #[tokio::test]
    async fn slow_default_tool_runs_degraded() {
        let ai = MockAIProvider::new().with_response("Guess");
        let tools = context_tool().with_tool_delay("get_context", Duration::from_millis(500));
        let handler = SingleShotDiagnoseHandler::new(
            Arc::new(ai),
            Arc::new(tools),
            DiagnosisSettings::default()
                .with_default_tool("get_context")
                .with_tool_timeout(Duration::from_millis(20)),
        );

        let outcome = handler.handle(command()).await.unwrap();

        assert!(!outcome.mcp_available);
    }

    #[tokio::test]
    async fn error_flagged_output_runs_degraded() {
        let ai = MockAIProvider::new().with_response("Guess");
        let tools = context_tool().with_error_output("get_context", "issue not found");
        let handler = SingleShotDiagnoseHandler::new(
            Arc::new(ai),
            Arc::new(tools),
            DiagnosisSettings::default().with_default_tool("get_context"),
        );

        let outcome = handler.handle(command()).await.unwrap();

        assert!(!outcome.mcp_available);
    }

    #[tokio::test]
    async fn model_failure_is_fatal() {
        let ai = MockAIProvider::new().with_error(MockError::AuthenticationFailed);
        let handler = SingleShotDiagnoseHandler::new(
            Arc::new(ai),
            Arc::new(context_tool()),
            DiagnosisSettings::default(),
        );

        let err = handler.handle(command()).await.unwrap_err();

        assert!(matches!(err, DiagnoseError::Model(AIError::AuthenticationFailed)));
    }
}
