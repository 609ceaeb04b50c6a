//! Layered application configuration.
//!
//! Server-level settings come from defaults, an optional YAML file, `GATEWAY_`
//! environment variables, and CLI flags, in ascending priority. Assistant API
//! credentials are loaded separately from plain environment variables so they
//! never land in a config file.

use std::env;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::assistant::{AssistantSettings, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Allowed CORS origin for the browser front-end
    #[arg(long, env = "CORS_ALLOWED_ORIGIN")]
    pub cors_allowed_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

impl AppConfig {
    /// Load configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument cannot be parsed, a named config file
    /// is unreadable, or the merged configuration does not deserialize.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(env::args())
    }

    /// Load configuration from explicit arguments (testable entry point).
    ///
    /// # Errors
    ///
    /// Same conditions as [`AppConfig::load`].
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("cors.allowed_origin", "http://localhost:4200")?;

        // Config file: an explicit path is required to exist, the implicit
        // ./config.yaml fallback is not.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }

        // Environment variables, e.g. GATEWAY_SERVER__PORT=8000.
        builder = builder.add_source(
            Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags (and their clap-bound env vars) override everything else.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(origin) = &cli.cors_allowed_origin {
            builder = builder.set_override("cors.allowed_origin", origin.clone())?;
        }

        builder.build()?.try_deserialize()
    }
}

/// Load assistant API settings from the environment.
///
/// # Errors
///
/// Returns a message naming the missing or empty variable.
pub fn load_assistant_settings() -> Result<AssistantSettings, String> {
    let base_url =
        env::var("ASSISTANT_BASE_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());
    if base_url.trim().is_empty() {
        return Err("ASSISTANT_BASE_URL cannot be empty".to_string());
    }

    let api_key = env::var("ASSISTANT_API_KEY")
        .map_err(|_| "Missing required env var: ASSISTANT_API_KEY".to_string())?;
    if api_key.trim().is_empty() {
        return Err("ASSISTANT_API_KEY cannot be empty".to_string());
    }

    let assistant_id = env::var("ASSISTANT_ID")
        .map_err(|_| "Missing required env var: ASSISTANT_ID".to_string())?;
    if assistant_id.trim().is_empty() {
        return Err("ASSISTANT_ID cannot be empty".to_string());
    }

    let poll_attempts = env::var("ASSISTANT_POLL_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POLL_ATTEMPTS);

    let poll_interval = env::var("ASSISTANT_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis);

    Ok(AssistantSettings {
        base_url,
        api_key,
        assistant_id,
        poll_attempts,
        poll_interval,
    })
}
