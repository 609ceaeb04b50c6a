//! Workflow driver for one question.
//!
//! The orchestrator takes a question through the assistant API's
//! asynchronous lifecycle:
//! 1. Create a conversation carrying the question as its sole user message
//! 2. Start a processing run against the configured assistant
//! 3. Poll the run status until it reaches a terminal state
//! 4. Fetch the conversation's messages and extract the answer
//!
//! Failure handling is two-tier. A transient error on a single status check
//! is logged and absorbed, since the remote side may still be processing. An
//! explicit `failed` status, an exhausted polling budget, or an error in any
//! other stage ends the workflow with a typed [`WorkflowError`].

use std::sync::Arc;

use uuid::Uuid;

use super::client::AssistantHttpClient;
use super::error::{ApiError, WorkflowError};
use super::protocol::{RunState, extract_answer};
use super::{AssistantApi, AssistantSettings};

/// Answer returned when a run finishes without producing assistant text.
/// An empty-but-successful run is a benign outcome, not a failure.
const EMPTY_ANSWER: &str = "no response found";

/// Drives one question through the four-stage remote workflow.
///
/// Each call to [`Orchestrator::answer`] is an independent workflow with its
/// own conversation and run identifiers; concurrent calls share nothing but
/// the underlying connection pool.
#[derive(Clone)]
pub struct Orchestrator {
    settings: AssistantSettings,
    api: Arc<dyn AssistantApi>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("assistant_id", &self.settings.assistant_id)
            .field("poll_attempts", &self.settings.poll_attempts)
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator backed by the production HTTP client.
    #[must_use]
    pub fn new(settings: AssistantSettings) -> Self {
        let api = Arc::new(AssistantHttpClient::new(settings.clone()));
        Self { settings, api }
    }

    /// Create an orchestrator over an arbitrary [`AssistantApi`]
    /// implementation.
    #[must_use]
    pub fn with_api(settings: AssistantSettings, api: Arc<dyn AssistantApi>) -> Self {
        Self { settings, api }
    }

    /// Run one question to completion and return the assistant's answer.
    ///
    /// Produces exactly one outcome: the answer text, or the failure of the
    /// stage that ended the workflow. There is no cross-stage retry; the
    /// caller resubmits to start a fresh workflow.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] naming the stage that failed.
    pub async fn answer(&self, question: &str) -> Result<String, WorkflowError> {
        let workflow_id = Uuid::new_v4().to_string();

        // Stage 1: create the conversation.
        let created = self
            .api
            .create_conversation(question)
            .await
            .map_err(WorkflowError::CreationFailed)?;
        let conversation_id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WorkflowError::CreationFailed(ApiError::MissingField("id")))?;
        tracing::info!(
            name: "workflow.conversation.created",
            workflow_id = %workflow_id,
            conversation_id = %conversation_id,
            "conversation created"
        );

        // Stage 2: start the run.
        let started = self
            .api
            .start_run(&conversation_id, &self.settings.assistant_id)
            .await
            .map_err(WorkflowError::RunStartFailed)?;
        let run_id = started
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WorkflowError::RunStartFailed(ApiError::MissingField("id")))?;
        tracing::info!(
            name: "workflow.run.started",
            workflow_id = %workflow_id,
            conversation_id = %conversation_id,
            run_id = %run_id,
            "run started"
        );

        // Stage 3: wait for the run to finish.
        self.wait_for_run(&workflow_id, &conversation_id, &run_id)
            .await?;

        // Stage 4: fetch the answer.
        let messages = self
            .api
            .list_messages(&conversation_id)
            .await
            .map_err(WorkflowError::FetchFailed)?;
        let answer = extract_answer(&messages).unwrap_or(EMPTY_ANSWER).to_string();

        tracing::info!(
            name: "workflow.finished",
            workflow_id = %workflow_id,
            conversation_id = %conversation_id,
            answer_length = answer.len(),
            "workflow finished"
        );
        Ok(answer)
    }

    /// Poll the run until it completes, fails, or exhausts the budget.
    ///
    /// A per-attempt client error never ends the loop: one flaky status
    /// check must not fail a workflow the remote side is still processing.
    /// An explicit `failed` status ends it immediately, with no further
    /// attempt.
    async fn wait_for_run(
        &self,
        workflow_id: &str,
        conversation_id: &str,
        run_id: &str,
    ) -> Result<(), WorkflowError> {
        let max_attempts = self.settings.poll_attempts;

        for attempt in 1..=max_attempts {
            match self.api.run_status(conversation_id, run_id).await {
                Ok(snapshot) => {
                    let raw = snapshot.status.as_deref().unwrap_or("unknown");
                    tracing::info!(
                        name: "workflow.run.polled",
                        workflow_id = %workflow_id,
                        conversation_id = %conversation_id,
                        run_id = %run_id,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        status = %raw,
                        "run status"
                    );
                    match snapshot.state() {
                        RunState::Completed => return Ok(()),
                        RunState::Failed => {
                            return Err(WorkflowError::RunFailed {
                                status: raw.to_string(),
                            });
                        }
                        RunState::Queued | RunState::Running | RunState::Unknown => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        name: "workflow.run.poll_failed",
                        workflow_id = %workflow_id,
                        run_id = %run_id,
                        attempt = attempt,
                        error = %e,
                        "run status check failed"
                    );
                }
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }

        Err(WorkflowError::Timeout {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::assistant::protocol::{
        ContentBlock, ConversationCreated, MessageList, RunSnapshot, RunStarted, TextBody,
        ThreadMessage,
    };

    /// One scripted outcome for a status poll.
    enum Poll {
        Status(&'static str),
        NoStatus,
        Error,
    }

    /// Scripted outcome for the message fetch.
    enum Fetch {
        Messages(MessageList),
        Error,
    }

    /// Plays back fixed responses and counts the status polls it serves.
    struct ScriptedApi {
        conversation_id: Option<&'static str>,
        run_id: Option<&'static str>,
        polls: Mutex<VecDeque<Poll>>,
        poll_count: AtomicUsize,
        fetch: Fetch,
    }

    impl ScriptedApi {
        fn new(polls: Vec<Poll>, fetch: Fetch) -> Self {
            Self {
                conversation_id: Some("conv_1"),
                run_id: Some("run_1"),
                polls: Mutex::new(polls.into()),
                poll_count: AtomicUsize::new(0),
                fetch,
            }
        }

        fn polls_served(&self) -> usize {
            self.poll_count.load(Ordering::SeqCst)
        }
    }

    fn decode_error() -> ApiError {
        ApiError::Json(serde_json::from_str::<serde_json::Value>("").unwrap_err())
    }

    fn assistant_text(value: &str) -> MessageList {
        MessageList {
            data: vec![
                ThreadMessage {
                    role: "user".to_string(),
                    content: vec![ContentBlock {
                        kind: "text".to_string(),
                        text: Some(TextBody {
                            value: "the question".to_string(),
                        }),
                    }],
                },
                ThreadMessage {
                    role: "assistant".to_string(),
                    content: vec![ContentBlock {
                        kind: "text".to_string(),
                        text: Some(TextBody {
                            value: value.to_string(),
                        }),
                    }],
                },
            ],
        }
    }

    #[async_trait::async_trait]
    impl AssistantApi for ScriptedApi {
        async fn create_conversation(
            &self,
            _question: &str,
        ) -> Result<ConversationCreated, ApiError> {
            Ok(ConversationCreated {
                id: self.conversation_id.map(str::to_string),
            })
        }

        async fn start_run(
            &self,
            conversation_id: &str,
            assistant_id: &str,
        ) -> Result<RunStarted, ApiError> {
            assert_eq!(conversation_id, "conv_1");
            assert_eq!(assistant_id, "asst_test");
            Ok(RunStarted {
                id: self.run_id.map(str::to_string),
            })
        }

        async fn run_status(
            &self,
            _conversation_id: &str,
            _run_id: &str,
        ) -> Result<RunSnapshot, ApiError> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            let next = self
                .polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Poll::Status("in_progress"));
            match next {
                Poll::Status(s) => Ok(RunSnapshot {
                    id: Some("run_1".to_string()),
                    status: Some(s.to_string()),
                }),
                Poll::NoStatus => Ok(RunSnapshot {
                    id: Some("run_1".to_string()),
                    status: None,
                }),
                Poll::Error => Err(decode_error()),
            }
        }

        async fn list_messages(&self, _conversation_id: &str) -> Result<MessageList, ApiError> {
            match &self.fetch {
                Fetch::Messages(list) => Ok(list.clone()),
                Fetch::Error => Err(decode_error()),
            }
        }
    }

    fn settings() -> AssistantSettings {
        AssistantSettings {
            base_url: "http://localhost".to_string(),
            api_key: "test-key".to_string(),
            assistant_id: "asst_test".to_string(),
            poll_attempts: 5,
            poll_interval: Duration::from_millis(10),
        }
    }

    fn orchestrator(api: &Arc<ScriptedApi>) -> Orchestrator {
        Orchestrator::with_api(settings(), Arc::clone(api) as Arc<dyn AssistantApi>)
    }

    #[tokio::test(start_paused = true)]
    async fn answers_when_run_completes_immediately() {
        let api = Arc::new(ScriptedApi::new(
            vec![Poll::Status("completed")],
            Fetch::Messages(assistant_text("42")),
        ));

        let answer = orchestrator(&api).answer("what is the answer?").await.unwrap();

        assert_eq!(answer, "42");
        assert_eq!(api.polls_served(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn accepts_succeeded_as_terminal_success() {
        let api = Arc::new(ScriptedApi::new(
            vec![Poll::Status("queued"), Poll::Status("succeeded")],
            Fetch::Messages(assistant_text("done")),
        ));

        let answer = orchestrator(&api).answer("q").await.unwrap();

        assert_eq!(answer, "done");
        assert_eq!(api.polls_served(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_failure_stops_polling_immediately() {
        let api = Arc::new(ScriptedApi::new(
            vec![
                Poll::Status("in_progress"),
                Poll::Status("failed"),
                Poll::Status("completed"),
            ],
            Fetch::Messages(assistant_text("never read")),
        ));

        let err = orchestrator(&api).answer("q").await.unwrap_err();

        assert!(matches!(err, WorkflowError::RunFailed { ref status } if status == "failed"));
        assert!(!err.is_transport());
        assert_eq!(api.polls_served(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_times_out() {
        let api = Arc::new(ScriptedApi::new(
            Vec::new(),
            Fetch::Messages(assistant_text("never read")),
        ));

        let err = orchestrator(&api).answer("q").await.unwrap_err();

        assert!(matches!(err, WorkflowError::Timeout { attempts: 5 }));
        assert_eq!(api.polls_served(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_poll_error_is_absorbed() {
        let api = Arc::new(ScriptedApi::new(
            vec![Poll::Error, Poll::Status("completed")],
            Fetch::Messages(assistant_text("recovered")),
        ));

        let answer = orchestrator(&api).answer("q").await.unwrap();

        assert_eq!(answer, "recovered");
        assert_eq!(api.polls_served(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_status_keeps_polling() {
        let api = Arc::new(ScriptedApi::new(
            vec![Poll::NoStatus, Poll::Status("completed")],
            Fetch::Messages(assistant_text("late")),
        ));

        let answer = orchestrator(&api).answer("q").await.unwrap();

        assert_eq!(answer, "late");
        assert_eq!(api.polls_served(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_conversation_yields_placeholder_answer() {
        let api = Arc::new(ScriptedApi::new(
            vec![Poll::Status("completed")],
            Fetch::Messages(MessageList::default()),
        ));

        let answer = orchestrator(&api).answer("q").await.unwrap();

        assert_eq!(answer, "no response found");
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_is_propagated() {
        let api = Arc::new(ScriptedApi::new(
            vec![Poll::Status("completed")],
            Fetch::Error,
        ));

        let err = orchestrator(&api).answer("q").await.unwrap_err();

        assert!(matches!(err, WorkflowError::FetchFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_conversation_id_fails_before_polling() {
        let mut api = ScriptedApi::new(Vec::new(), Fetch::Messages(MessageList::default()));
        api.conversation_id = None;
        let api = Arc::new(api);

        let err = orchestrator(&api).answer("q").await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::CreationFailed(ApiError::MissingField("id"))
        ));
        assert_eq!(api.polls_served(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_run_id_fails_before_polling() {
        let mut api = ScriptedApi::new(Vec::new(), Fetch::Messages(MessageList::default()));
        api.run_id = None;
        let api = Arc::new(api);

        let err = orchestrator(&api).answer("q").await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::RunStartFailed(ApiError::MissingField("id"))
        ));
        assert_eq!(api.polls_served(), 0);
    }
}
