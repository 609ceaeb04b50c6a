//! Assistant API orchestration.
//!
//! This module drives a user question through the remote assistant API's
//! asynchronous workflow: create a conversation, start a processing run,
//! poll the run until it reaches a terminal state, then fetch the answer.
//!
//! # Overview
//!
//! The [`AssistantApi`] trait defines the four remote operations the
//! workflow needs. [`AssistantHttpClient`] implements it over `reqwest`;
//! the [`Orchestrator`] builds on top of the trait to sequence the stages
//! and classify failures.
//!
//! # Modules
//!
//! - [`client`]: HTTP implementation of the remote operations
//! - [`error`]: client-level and workflow-level error taxonomy
//! - [`orchestrator`]: the four-stage workflow driver
//! - [`protocol`]: permissive wire types and answer extraction

pub mod client;
pub mod error;
pub mod orchestrator;
pub mod protocol;

pub use client::AssistantHttpClient;
pub use error::{ApiError, WorkflowError};
pub use orchestrator::Orchestrator;

use std::time::Duration;

use protocol::{ConversationCreated, MessageList, RunSnapshot, RunStarted};

/// Default polling budget: at most 120 status checks per run.
pub const DEFAULT_POLL_ATTEMPTS: usize = 120;

/// Default delay between consecutive status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Assistant API connection and workflow settings.
///
/// Supplied once at construction and treated as immutable for the lifetime
/// of the orchestrator.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Base URL for the assistant API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Bearer credential sent with every request.
    pub api_key: String,
    /// Identifier of the assistant that processes runs.
    pub assistant_id: String,
    /// Maximum number of run-status checks per workflow.
    pub poll_attempts: usize,
    /// Delay between run-status checks.
    pub poll_interval: Duration,
}

impl AssistantSettings {
    /// Create settings with the default polling budget.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        assistant_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            assistant_id: assistant_id.into(),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Remote operations the orchestrator drives.
///
/// The four calls mirror the assistant API's conversation/run lifecycle.
/// Implemented by [`AssistantHttpClient`] in production and by scripted
/// fixtures in tests.
#[async_trait::async_trait]
pub trait AssistantApi: Send + Sync {
    /// Create a conversation seeded with the user's question.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    async fn create_conversation(&self, question: &str) -> Result<ConversationCreated, ApiError>;

    /// Start a processing run for the conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    async fn start_run(
        &self,
        conversation_id: &str,
        assistant_id: &str,
    ) -> Result<RunStarted, ApiError>;

    /// Fetch the current status of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    async fn run_status(&self, conversation_id: &str, run_id: &str)
    -> Result<RunSnapshot, ApiError>;

    /// List the conversation's messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    async fn list_messages(&self, conversation_id: &str) -> Result<MessageList, ApiError>;
}
