//! ConversationDriver - The bounded model/tool loop.
//!
//! Each iteration makes one model call. A reply that requests tools is
//! appended verbatim, every requested call is dispatched concurrently, and
//! the results are folded back as one user turn in request order. The loop
//! ends on the first reply that asks for nothing, or at the iteration
//! ceiling.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use super::settings::DiagnosisSettings;
use crate::application::deadline::with_deadline;
use crate::domain::diagnosis::{
    prompts, Conversation, ConversationError, IssueReport, LoopOutcome, Termination, ToolCatalog,
    ToolInvocationRequest, ToolInvocationResult,
};
use crate::domain::foundation::RunId;
use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, RequestMetadata, ToolService,
};

/// Errors that end a run without an answer.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The model call failed or missed its deadline.
    #[error("model call failed on iteration {iteration}: {source}")]
    Model {
        iteration: u32,
        #[source]
        source: AIError,
    },

    /// An append would have broken the conversation rules.
    #[error("conversation invariant violated: {0}")]
    Conversation(#[from] ConversationError),

    /// The iteration ceiling leaves no room for a model call.
    #[error("max_iterations must be at least 1")]
    NoIterations,
}

/// Runs the model/tool exchange for one issue.
pub struct ConversationDriver {
    ai_provider: Arc<dyn AIProvider>,
    tools: Arc<dyn ToolService>,
    settings: DiagnosisSettings,
}

impl ConversationDriver {
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

    pub async fn run(
        &self,
        run_id: RunId,
        issue: &IssueReport,
        catalog: &ToolCatalog,
    ) -> Result<LoopOutcome, DriverError> {
        let tools_available = catalog.is_available();
        let system_prompt = prompts::system_instruction(tools_available);
        let offered = catalog.tools().to_vec();
        let max_iterations = self.settings.max_iterations;

        let mut conversation = Conversation::seeded(prompts::render_task(issue));
        let mut tools_used: Vec<String> = Vec::new();

        for iteration in 1..=max_iterations {
            let mut request = CompletionRequest::new(RequestMetadata::new(run_id, iteration))
                .with_system_prompt(system_prompt)
                .with_messages(conversation.turns().to_vec())
                .with_tools(offered.clone());
            if let Some(max_tokens) = self.settings.max_tokens {
                request = request.with_max_tokens(max_tokens);
            }

            let reply = self.call_model(request, iteration).await?;
            let requests = reply.tool_requests();
            let answer = reply.text_content();

            // Degraded runs never dispatch, whatever the reply asks for.
            if !tools_available || !reply.requests_tools() || requests.is_empty() {
                return Ok(finish(answer, iteration, tools_available, tools_used, Termination::Completed));
            }

            if iteration == max_iterations {
                tracing::warn!(
                    iteration,
                    pending_tools = requests.len(),
                    "iteration ceiling reached with tool requests outstanding"
                );
                return Ok(finish(
                    answer,
                    iteration,
                    tools_available,
                    tools_used,
                    Termination::IterationCeiling,
                ));
            }

            conversation.push_assistant(reply.content)?;
            let results = self.dispatch(&requests, catalog, &mut tools_used).await;
            conversation.push_tool_results(results)?;
        }

        Err(DriverError::NoIterations)
    }

    async fn call_model(
        &self,
        request: CompletionRequest,
        iteration: u32,
    ) -> Result<CompletionResponse, DriverError> {
        let started = Instant::now();
        let limit = self.settings.model_timeout;

        let reply = match with_deadline(limit, "model call", self.ai_provider.complete(request)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(source)) => return Err(DriverError::Model { iteration, source }),
            Err(_) => {
                return Err(DriverError::Model {
                    iteration,
                    source: AIError::timeout(limit),
                })
            }
        };

        tracing::info!(
            iteration,
            stop_reason = %reply.stop_reason,
            prompt_tokens = reply.usage.prompt_tokens,
            completion_tokens = reply.usage.completion_tokens,
            estimated_cost_cents = reply.usage.estimated_cost_cents,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model replied"
        );

        Ok(reply)
    }

    /// Dispatches every request concurrently and waits for all of them.
    ///
    /// Results come back in request order. Names of tools that were actually
    /// invoked are appended to `tools_used` in the same order.
    async fn dispatch(
        &self,
        requests: &[ToolInvocationRequest],
        catalog: &ToolCatalog,
        tools_used: &mut Vec<String>,
    ) -> Vec<ToolInvocationResult> {
        let calls = requests
            .iter()
            .map(|request| self.dispatch_one(request, catalog));
        let outcomes = join_all(calls).await;

        outcomes
            .into_iter()
            .zip(requests)
            .map(|((result, invoked), request)| {
                if invoked {
                    tools_used.push(request.name().to_string());
                }
                result
            })
            .collect()
    }

    /// Returns the result and whether the tool service was called.
    async fn dispatch_one(
        &self,
        request: &ToolInvocationRequest,
        catalog: &ToolCatalog,
    ) -> (ToolInvocationResult, bool) {
        if !catalog.contains(request.name()) {
            tracing::warn!(tool = request.name(), "model requested a tool outside the catalog");
            return (
                ToolInvocationResult::failure(
                    request.id(),
                    format!("unknown tool: {}", request.name()),
                ),
                false,
            );
        }

        let started = Instant::now();
        let call = self.tools.invoke(request.name(), request.input().clone());
        let result = match with_deadline(self.settings.tool_timeout, "tool call", call).await {
            Ok(Ok(output)) => {
                ToolInvocationResult::from_output(request.id(), output.content, output.is_error)
            }
            Ok(Err(e)) => ToolInvocationResult::failure(request.id(), e.to_string()),
            Err(deadline) => ToolInvocationResult::failure(request.id(), deadline.to_string()),
        };

        tracing::info!(
            tool = request.name(),
            is_error = result.is_error(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool call finished"
        );

        (result, true)
    }
}

fn finish(
    answer: String,
    iterations: u32,
    mcp_available: bool,
    tools_used: Vec<String>,
    termination: Termination,
) -> LoopOutcome {
    tracing::info!(%termination, iterations, tools = tools_used.len(), "diagnosis loop finished");

    LoopOutcome {
        answer,
        iterations,
        mcp_available,
        tools_used,
        termination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::mcp::MockToolService;
    use crate::domain::diagnosis::{ContentBlock, Role, ToolDescriptor, TurnContent};
    use crate::ports::{StopReason, ToolServiceError};
    use proptest::prelude::*;
    use std::time::Duration;

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "desc", serde_json::json!({"type": "object"}))
    }

    fn issue() -> IssueReport {
        IssueReport::new(
            "Button not saving",
            "Users report the save button does nothing on the profile page",
        )
        .unwrap()
    }

    fn tool_use(id: &str, name: &str) -> ContentBlock {
        ContentBlock::ToolUse(ToolInvocationRequest::new(
            id,
            name,
            serde_json::json!({"page": "profile"}),
        ))
    }

    fn driver(
        ai: &MockAIProvider,
        tools: &MockToolService,
        settings: DiagnosisSettings,
    ) -> ConversationDriver {
        ConversationDriver::new(Arc::new(ai.clone()), Arc::new(tools.clone()), settings)
    }

    #[tokio::test]
    async fn final_reply_completes_in_one_iteration() {
        let ai = MockAIProvider::new().with_response("Root cause: missing handler");
        let tools = MockToolService::new().with_tool(tool("get_tree"));
        let catalog = ToolCatalog::from_descriptors(vec![tool("get_tree")]);

        let outcome = driver(&ai, &tools, DiagnosisSettings::default())
            .run(RunId::new(), &issue(), &catalog)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Root cause: missing handler");
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.mcp_available);
        assert!(outcome.tools_used.is_empty());
        assert_eq!(outcome.termination, Termination::Completed);
        assert_eq!(ai.get_calls()[0].tools.len(), 1);
    }

    #[tokio::test]
    async fn tool_round_is_folded_into_next_request() {
        let ai = MockAIProvider::new()
            .with_tool_use("toolu_1", "get_tree", serde_json::json!({"page": "profile"}))
            .with_response("The save handler is unbound");
        let tools = MockToolService::new()
            .with_tool(tool("get_tree"))
            .with_output("get_tree", "<Page name=\"profile\"/>");
        let catalog = ToolCatalog::from_descriptors(vec![tool("get_tree")]);

        let outcome = driver(&ai, &tools, DiagnosisSettings::default())
            .run(RunId::new(), &issue(), &catalog)
            .await
            .unwrap();

        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.tools_used, vec!["get_tree".to_string()]);

        let calls = ai.get_calls();
        assert_eq!(calls[0].messages.len(), 1);
        let second = &calls[1].messages;
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role(), Role::Assistant);
        assert_eq!(second[1].tool_requests()[0].id(), "toolu_1");
        assert_eq!(second[2].role(), Role::User);
        let results = second[2].tool_results_in_turn();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tool_use_id(), "toolu_1");
        assert_eq!(results[0].content(), "<Page name=\"profile\"/>");
        assert!(!results[0].is_error());

        assert_eq!(
            tools.get_calls()[0].arguments,
            serde_json::json!({"page": "profile"})
        );
    }

    #[tokio::test]
    async fn degraded_mode_never_dispatches() {
        let ai = MockAIProvider::new()
            .with_tool_use("toolu_1", "get_tree", serde_json::json!({}));
        let tools = MockToolService::new().with_tool(tool("get_tree"));
        let catalog = ToolCatalog::unavailable("connection failed: refused");

        let outcome = driver(&ai, &tools, DiagnosisSettings::default())
            .run(RunId::new(), &issue(), &catalog)
            .await
            .unwrap();

        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.mcp_available);
        assert_eq!(tools.call_count(), 0);
        let request = &ai.get_calls()[0];
        assert!(request.tools.is_empty());
        assert!(request.system_prompt.contains("unavailable"));
    }

    #[tokio::test]
    async fn tool_use_stop_without_blocks_is_final() {
        let ai = MockAIProvider::new()
            .with_reply(vec![ContentBlock::text("Nothing to call")], StopReason::ToolUse);
        let tools = MockToolService::new().with_tool(tool("get_tree"));
        let catalog = ToolCatalog::from_descriptors(vec![tool("get_tree")]);

        let outcome = driver(&ai, &tools, DiagnosisSettings::default())
            .run(RunId::new(), &issue(), &catalog)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Nothing to call");
        assert_eq!(outcome.termination, Termination::Completed);
    }

    #[tokio::test]
    async fn ceiling_stops_with_last_text() {
        let mut ai = MockAIProvider::new();
        for i in 0..3 {
            ai = ai.with_reply(
                vec![
                    ContentBlock::text(format!("round {}", i)),
                    tool_use(&format!("t{}", i), "get_tree"),
                ],
                StopReason::ToolUse,
            );
        }
        let tools = MockToolService::new().with_tool(tool("get_tree"));
        let catalog = ToolCatalog::from_descriptors(vec![tool("get_tree")]);

        let outcome = driver(&ai, &tools, DiagnosisSettings::default().with_max_iterations(3))
            .run(RunId::new(), &issue(), &catalog)
            .await
            .unwrap();

        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.termination, Termination::IterationCeiling);
        assert_eq!(outcome.answer, "round 2");
        // The last reply's requests are not dispatched.
        assert_eq!(tools.call_count(), 2);
        assert_eq!(outcome.tools_used.len(), 2);
    }

    #[tokio::test]
    async fn slow_tool_yields_error_result() {
        let ai = MockAIProvider::new()
            .with_reply(
                vec![tool_use("fast", "get_logs"), tool_use("slow", "get_tree")],
                StopReason::ToolUse,
            )
            .with_response("done");
        let tools = MockToolService::new()
            .with_tool(tool("get_tree"))
            .with_tool(tool("get_logs"))
            .with_output("get_logs", "no errors")
            .with_tool_delay("get_tree", Duration::from_millis(500));
        let catalog = ToolCatalog::from_descriptors(vec![tool("get_tree"), tool("get_logs")]);
        let settings = DiagnosisSettings::default().with_tool_timeout(Duration::from_millis(30));

        let outcome = driver(&ai, &tools, settings)
            .run(RunId::new(), &issue(), &catalog)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "done");
        assert_eq!(outcome.tools_used, vec!["get_logs".to_string(), "get_tree".to_string()]);

        let folded = ai.get_calls()[1].messages[2].clone();
        let results = folded.tool_results_in_turn();
        assert_eq!(results[0].tool_use_id(), "fast");
        assert!(!results[0].is_error());
        assert_eq!(results[1].tool_use_id(), "slow");
        assert!(results[1].is_error());
        assert!(results[1].content().contains("timed out"));
    }

    #[tokio::test]
    async fn failing_and_unknown_tools_are_isolated() {
        let ai = MockAIProvider::new()
            .with_reply(
                vec![tool_use("a", "get_tree"), tool_use("b", "drop_tables")],
                StopReason::ToolUse,
            )
            .with_response("done");
        let tools = MockToolService::new()
            .with_tool(tool("get_tree"))
            .with_failure("get_tree", ToolServiceError::connection("reset by peer"));
        let catalog = ToolCatalog::from_descriptors(vec![tool("get_tree")]);

        let outcome = driver(&ai, &tools, DiagnosisSettings::default())
            .run(RunId::new(), &issue(), &catalog)
            .await
            .unwrap();

        assert_eq!(outcome.tools_used, vec!["get_tree".to_string()]);
        let folded = ai.get_calls()[1].messages[2].clone();
        let results = folded.tool_results_in_turn();
        assert_eq!(results[0].content(), "Error: connection failed: reset by peer");
        assert_eq!(results[1].content(), "Error: unknown tool: drop_tables");
        assert_eq!(tools.call_count(), 1);
    }

    #[tokio::test]
    async fn model_timeout_is_fatal() {
        let ai = MockAIProvider::new()
            .with_response("too late")
            .with_delay(Duration::from_millis(500));
        let tools = MockToolService::new();
        let settings = DiagnosisSettings::default().with_model_timeout(Duration::from_millis(20));

        let err = driver(&ai, &tools, settings)
            .run(RunId::new(), &issue(), &ToolCatalog::unavailable("x"))
            .await
            .unwrap_err();

        match err {
            DriverError::Model { iteration, source } => {
                assert_eq!(iteration, 1);
                assert!(source.is_timeout());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn model_failure_is_fatal() {
        let ai = MockAIProvider::new().with_error(MockError::Unavailable {
            message: "overloaded".into(),
        });

        let err = driver(&ai, &MockToolService::new(), DiagnosisSettings::default())
            .run(RunId::new(), &issue(), &ToolCatalog::unavailable("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, DriverError::Model { source: AIError::Unavailable { .. }, .. }));
    }

    #[tokio::test]
    async fn zero_iterations_is_rejected() {
        let ai = MockAIProvider::new();
        let err = driver(&ai, &MockToolService::new(), DiagnosisSettings::default().with_max_iterations(0))
            .run(RunId::new(), &issue(), &ToolCatalog::unavailable("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, DriverError::NoIterations));
        assert_eq!(ai.call_count(), 0);
    }

    #[tokio::test]
    async fn seeded_turn_is_rendered_issue() {
        let ai = MockAIProvider::new().with_response("ok");

        driver(&ai, &MockToolService::new(), DiagnosisSettings::default())
            .run(RunId::new(), &issue(), &ToolCatalog::unavailable("x"))
            .await
            .unwrap();

        match ai.get_calls()[0].messages[0].content() {
            TurnContent::Text(text) => assert!(text.contains("Title: Button not saving")),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn iterations_stay_within_bounds(
            max_iterations in 1u32..6,
            tool_rounds in 0usize..8,
            width in 1usize..4,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let mut ai = MockAIProvider::new();
            for round in 0..tool_rounds {
                let blocks = (0..width)
                    .map(|i| tool_use(&format!("r{}-{}", round, i), "get_tree"))
                    .collect();
                ai = ai.with_reply(blocks, StopReason::ToolUse);
            }
            ai = ai.with_response("final");

            let tools = MockToolService::new().with_tool(tool("get_tree"));
            let catalog = ToolCatalog::from_descriptors(vec![tool("get_tree")]);
            let settings = DiagnosisSettings::default().with_max_iterations(max_iterations);

            let outcome = runtime
                .block_on(driver(&ai, &tools, settings).run(RunId::new(), &issue(), &catalog))
                .unwrap();

            prop_assert!(outcome.iterations >= 1);
            prop_assert!(outcome.iterations <= max_iterations);
            prop_assert_eq!(
                outcome.iterations,
                std::cmp::min(tool_rounds as u32 + 1, max_iterations)
            );
            prop_assert_eq!(
                outcome.hit_ceiling(),
                (tool_rounds as u32) >= max_iterations
            );

            // Every request the model saw was paired with its results.
            for call in ai.get_calls() {
                let mut conversation = Conversation::seeded("check");
                for turn in call.messages.iter().skip(1) {
                    match turn.role() {
                        Role::Assistant => conversation.push_assistant(turn.blocks().to_vec()).unwrap(),
                        Role::User => conversation
                            .push_tool_results(turn.tool_results_in_turn().into_iter().cloned().collect())
                            .unwrap(),
                    }
                }
                prop_assert!(conversation.verify_pairing().is_ok());
            }
        }
    }
}
