//! Error taxonomy for the assistant workflow.
//!
//! Two layers: [`ApiError`] describes why a single remote call failed, and
//! [`WorkflowError`] records which stage of the workflow that failure ended.
//! The split keeps the gateway's status-code mapping honest: a transport
//! failure surfaces as 502 no matter which stage it hit, while a well-formed
//! but unusable remote response stays a 500.

use thiserror::Error;

/// Failure of a single remote call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure or non-success HTTP status.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
    /// Response decoded but lacked a required field.
    #[error("response missing `{0}`")]
    MissingField(&'static str),
}

impl ApiError {
    /// Whether this failure happened at the transport layer, as opposed to a
    /// response the remote system produced but we could not use.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Terminal failure of one question's workflow.
///
/// Exactly one outcome (an answer or one of these) is produced per question;
/// there is no cross-stage retry. The caller resubmits to start a fresh
/// workflow with new conversation and run identifiers.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Stage 1: the conversation could not be created.
    #[error("failed to create conversation: {0}")]
    CreationFailed(#[source] ApiError),
    /// Stage 2: the processing run could not be started.
    #[error("failed to start run: {0}")]
    RunStartFailed(#[source] ApiError),
    /// Stage 3: the remote system reported the run as failed.
    #[error("run finished with status `{status}`")]
    RunFailed {
        /// Raw status string observed on the final poll.
        status: String,
    },
    /// Stage 3: the polling budget ran out before a terminal status.
    #[error("run did not finish within {attempts} status checks")]
    Timeout {
        /// Number of status checks performed.
        attempts: usize,
    },
    /// Stage 4: the finished conversation's messages could not be fetched.
    #[error("failed to fetch messages: {0}")]
    FetchFailed(#[source] ApiError),
}

impl WorkflowError {
    /// Whether the underlying cause was a transport failure.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::CreationFailed(e) | Self::RunStartFailed(e) | Self::FetchFailed(e) => {
                e.is_transport()
            }
            Self::RunFailed { .. } | Self::Timeout { .. } => false,
        }
    }
}
