//! Wire types for the assistant API.
//!
//! Decoding is deliberately permissive: the remote contract is additive, so
//! unknown fields are ignored and absent fields fall back to defaults. Only
//! the handful of fields the workflow consumes are modeled.

use serde::Deserialize;

/// Response to conversation creation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationCreated {
    /// Opaque conversation identifier.
    #[serde(default)]
    pub id: Option<String>,
}

/// Response to run creation.
#[derive(Debug, Clone, Deserialize)]
pub struct RunStarted {
    /// Opaque run identifier.
    #[serde(default)]
    pub id: Option<String>,
}

/// A point-in-time view of a run, as reported by the remote system.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSnapshot {
    /// Run identifier echoed back by the remote system.
    #[serde(default)]
    pub id: Option<String>,
    /// Raw status string; `None` when the payload carried no status.
    #[serde(default)]
    pub status: Option<String>,
}

impl RunSnapshot {
    /// Classify the raw status into a [`RunState`].
    #[must_use]
    pub fn state(&self) -> RunState {
        self.status
            .as_deref()
            .map_or(RunState::Unknown, RunState::classify)
    }
}

/// Run lifecycle states the orchestrator distinguishes.
///
/// Transitions are driven entirely by the remote system; the orchestrator
/// observes them through polling and never writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting for the remote system to pick the run up.
    Queued,
    /// Being processed.
    Running,
    /// Finished successfully; output is available.
    Completed,
    /// Finished unsuccessfully; no output will be produced.
    Failed,
    /// Any status outside the known vocabulary.
    Unknown,
}

impl RunState {
    /// Map a raw status string to a state, ASCII case-insensitively.
    ///
    /// The remote vocabulary has drifted over time: successful runs have been
    /// reported as both `succeeded` and `completed`, so both classify as
    /// [`RunState::Completed`].
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "queued" => Self::Queued,
            "running" | "in_progress" => Self::Running,
            "completed" | "succeeded" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// Whether no further state change can occur.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Message list returned by the conversation's message endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageList {
    /// Messages, newest first as delivered by the remote system.
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadMessage {
    /// Author role (`user` or `assistant`).
    #[serde(default)]
    pub role: String,
    /// Ordered content blocks.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One content block of a message. Only `text` blocks are consumed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlock {
    /// Block type tag.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Text payload, present on `text` blocks.
    #[serde(default)]
    pub text: Option<TextBody>,
}

/// Body of a `text` content block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextBody {
    /// The answer text.
    #[serde(default)]
    pub value: String,
}

/// Pull the answer out of a message list: the first `text` block across
/// `assistant`-role messages, in list order.
#[must_use]
pub fn extract_answer(messages: &MessageList) -> Option<&str> {
    messages
        .data
        .iter()
        .filter(|m| m.role.eq_ignore_ascii_case("assistant"))
        .flat_map(|m| m.content.iter())
        .find(|block| block.kind.eq_ignore_ascii_case("text"))
        .and_then(|block| block.text.as_ref())
        .map(|t| t.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_statuses() {
        assert_eq!(RunState::classify("queued"), RunState::Queued);
        assert_eq!(RunState::classify("running"), RunState::Running);
        assert_eq!(RunState::classify("in_progress"), RunState::Running);
        assert_eq!(RunState::classify("failed"), RunState::Failed);
        assert_eq!(RunState::classify("cancelled"), RunState::Unknown);
    }

    #[test]
    fn classify_accepts_both_success_vocabularies() {
        assert_eq!(RunState::classify("completed"), RunState::Completed);
        assert_eq!(RunState::classify("succeeded"), RunState::Completed);
        assert_eq!(RunState::classify("COMPLETED"), RunState::Completed);
        assert_eq!(RunState::classify("Succeeded"), RunState::Completed);
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Queued.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(!RunState::Unknown.is_terminal());
    }

    #[test]
    fn snapshot_without_status_is_unknown() {
        let snapshot: RunSnapshot = serde_json::from_str(r#"{"id": "run_1"}"#).unwrap();
        assert_eq!(snapshot.state(), RunState::Unknown);
    }

    #[test]
    fn decoding_tolerates_unknown_fields() {
        let raw = r#"{
            "id": "thread_abc",
            "object": "thread",
            "created_at": 1699000000,
            "metadata": {}
        }"#;
        let created: ConversationCreated = serde_json::from_str(raw).unwrap();
        assert_eq!(created.id.as_deref(), Some("thread_abc"));
    }

    #[test]
    fn extracts_first_assistant_text_block() {
        let raw = r#"{
            "data": [
                {
                    "role": "user",
                    "content": [{"type": "text", "text": {"value": "the question"}}]
                },
                {
                    "role": "assistant",
                    "content": [
                        {"type": "image_file", "image_file": {"file_id": "file_1"}},
                        {"type": "text", "text": {"value": "the answer"}}
                    ]
                },
                {
                    "role": "assistant",
                    "content": [{"type": "text", "text": {"value": "an older answer"}}]
                }
            ]
        }"#;
        let list: MessageList = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_answer(&list), Some("the answer"));
    }

    #[test]
    fn no_assistant_text_yields_none() {
        let raw = r#"{
            "data": [
                {
                    "role": "user",
                    "content": [{"type": "text", "text": {"value": "hello?"}}]
                }
            ]
        }"#;
        let list: MessageList = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_answer(&list), None);

        let empty = MessageList::default();
        assert_eq!(extract_answer(&empty), None);
    }
}
