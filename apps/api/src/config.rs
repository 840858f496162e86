use anyhow::{Context, Result};

use crate::session::DEFAULT_IDLE_TIMEOUT_SECS;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_IDENTITY_API_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
const PLACEHOLDER_PREFIX: &str = "REPLACE_WITH_";

/// Application configuration loaded from environment variables.
/// Fails at startup if the generation key is missing. Identity settings are optional:
/// without them the service starts, but every session-gated route reports a setup notice.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub generation_timeout_secs: u64,
    pub identity: IdentityConfig,
    pub session_idle_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

/// Connection parameters for the external identity provider. Opaque to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub api_base: String,
}

impl IdentityConfig {
    /// True only when every parameter is present and none is a leftover placeholder.
    pub fn is_configured(&self) -> bool {
        [&self.api_key, &self.auth_domain, &self.project_id]
            .iter()
            .all(|value| match value {
                Some(v) => !v.trim().is_empty() && !v.starts_with(PLACEHOLDER_PREFIX),
                None => false,
            })
    }

    /// Names of the variables an operator still has to set.
    pub fn missing_variables(&self) -> Vec<&'static str> {
        [
            ("IDENTITY_API_KEY", &self.api_key),
            ("IDENTITY_AUTH_DOMAIN", &self.auth_domain),
            ("IDENTITY_PROJECT_ID", &self.project_id),
        ]
        .into_iter()
        .filter(|(_, value)| match value {
            Some(v) => v.trim().is_empty() || v.starts_with(PLACEHOLDER_PREFIX),
            None => true,
        })
        .map(|(name, _)| name)
        .collect()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: optional_env("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            generation_timeout_secs: optional_env("GENERATION_TIMEOUT_SECS")
                .unwrap_or_else(|| "120".to_string())
                .parse::<u64>()
                .context("GENERATION_TIMEOUT_SECS must be a whole number of seconds")?,
            identity: IdentityConfig {
                api_key: optional_env("IDENTITY_API_KEY"),
                auth_domain: optional_env("IDENTITY_AUTH_DOMAIN"),
                project_id: optional_env("IDENTITY_PROJECT_ID"),
                api_base: optional_env("IDENTITY_API_BASE")
                    .unwrap_or_else(|| DEFAULT_IDENTITY_API_BASE.to_string()),
            },
            session_idle_timeout_secs: optional_env("SESSION_IDLE_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("SESSION_IDLE_TIMEOUT_SECS must be a whole number of seconds")?
                .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
