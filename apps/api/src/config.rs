use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_SQLITE_PATH: &str = "data/learnpath.db";
const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-4";

/// Where rows live. A `DATABASE_URL` selects a remote Postgres; without it the
/// service falls back to a local SQLite file.
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseTarget {
    Postgres { url: String },
    Sqlite { path: PathBuf },
}

/// Token signing settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiry_mins: i64,
}

/// Text-generation provider settings.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Clone)]
pub struct Config {
    pub database: DatabaseTarget,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => DatabaseTarget::Postgres { url },
            None => DatabaseTarget::Sqlite {
                path: lookup("SQLITE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            },
        };

        let jwt_secret = require(&lookup, "JWT_SECRET")?;
        anyhow::ensure!(!jwt_secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        anyhow::ensure!(
            access_token_expiry_mins > 0,
            "ACCESS_TOKEN_EXPIRE_MINUTES must be positive"
        );

        let timeout_secs: u64 = parse_or(&lookup, "LLM_TIMEOUT_SECS", 60)?;

        Ok(Config {
            database,
            auth: AuthConfig {
                jwt_secret,
                access_token_expiry_mins,
            },
            llm: LlmConfig {
                api_key: require(&lookup, "LLM_API_KEY")?,
                api_url: lookup("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
                model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
            port: parse_or(&lookup, "PORT", 8000).context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
