//! Assistant Gateway
//!
//! An HTTP gateway that forwards user questions to a remote assistant API,
//! drives the asynchronous conversation/run workflow to completion, and
//! returns the generated answer.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server exposing a single chat endpoint
//! - **Orchestration**: four-stage workflow driver (create conversation,
//!   start run, poll to completion, fetch answer)
//! - **Client**: `reqwest`-based implementation of the remote operations
//!
//! # Modules
//!
//! - [`assistant`]: workflow driver, remote client, and wire types
//! - [`config`]: layered configuration and assistant settings
//! - [`server`]: router, chat handler, and server startup

pub mod assistant;
pub mod config;
pub mod server;

use std::sync::Arc;

use crate::assistant::Orchestrator;
use crate::config::AppConfig;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Workflow orchestrator for chat interactions.
    pub orchestrator: Arc<Orchestrator>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}
