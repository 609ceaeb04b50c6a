//! HTTP client for the assistant API.
//!
//! Implements [`AssistantApi`] over `reqwest`, one method per remote
//! operation. Every request carries the bearer credential and the
//! protocol-version header; every response body is logged raw at `debug`
//! before decoding, so a misbehaving remote can be diagnosed from the logs.

use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::protocol::{ConversationCreated, MessageList, RunSnapshot, RunStarted};
use super::{AssistantApi, AssistantSettings};

/// Protocol-version header required by the assistants endpoints.
const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VERSION: &str = "assistants=v2";

/// Production [`AssistantApi`] implementation.
///
/// The inner `reqwest::Client` holds the shared connection pool; cloning the
/// client is cheap and all clones reuse the same pool.
#[derive(Clone)]
pub struct AssistantHttpClient {
    http: reqwest::Client,
    settings: AssistantSettings,
}

impl std::fmt::Debug for AssistantHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantHttpClient")
            .field("base_url", &self.settings.base_url)
            .field("assistant_id", &self.settings.assistant_id)
            .finish()
    }
}

impl AssistantHttpClient {
    /// Create a client with the given settings.
    #[must_use]
    pub fn new(settings: AssistantSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.settings.base_url.trim_end_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        operation: &'static str,
    ) -> Result<T, ApiError> {
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.settings.api_key)
            .header(BETA_HEADER, BETA_VERSION)
            .send()
            .await?
            .error_for_status()?;

        let raw = resp.text().await?;
        tracing::debug!(
            name: "assistant.response",
            operation = operation,
            payload = %raw,
            "assistant API response"
        );
        Ok(serde_json::from_str(&raw)?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: String,
        body: &serde_json::Value,
        operation: &'static str,
    ) -> Result<T, ApiError> {
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .header(BETA_HEADER, BETA_VERSION)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        let raw = resp.text().await?;
        tracing::debug!(
            name: "assistant.response",
            operation = operation,
            payload = %raw,
            "assistant API response"
        );
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait::async_trait]
impl AssistantApi for AssistantHttpClient {
    async fn create_conversation(&self, question: &str) -> Result<ConversationCreated, ApiError> {
        let body = serde_json::json!({
            "messages": [
                { "role": "user", "content": question }
            ]
        });
        self.post_json(self.url("/v1/threads"), &body, "create_conversation")
            .await
    }

    async fn start_run(
        &self,
        conversation_id: &str,
        assistant_id: &str,
    ) -> Result<RunStarted, ApiError> {
        let body = serde_json::json!({ "assistant_id": assistant_id });
        self.post_json(
            self.url(&format!("/v1/threads/{conversation_id}/runs")),
            &body,
            "start_run",
        )
        .await
    }

    async fn run_status(
        &self,
        conversation_id: &str,
        run_id: &str,
    ) -> Result<RunSnapshot, ApiError> {
        self.get_json(
            self.url(&format!("/v1/threads/{conversation_id}/runs/{run_id}")),
            "run_status",
        )
        .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<MessageList, ApiError> {
        self.get_json(
            self.url(&format!("/v1/threads/{conversation_id}/messages")),
            "list_messages",
        )
        .await
    }
}
