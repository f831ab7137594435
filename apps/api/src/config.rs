use std::str::FromStr;

use anyhow::{bail, Context, Result};

const MAX_DEBOUNCE_MS: u64 = 60 * 60 * 1000;
const MAX_SESSION_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub sendgrid_api_key: String,
    pub mail_default_sender: String,
    /// Base URL used to build interview links in invitation emails.
    pub public_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Accepted tab switches that terminate an interview.
    pub tab_switch_limit: u32,
    pub tab_switch_debounce_ms: i64,
    /// Unfinished sessions older than this are evicted.
    pub session_max_age_secs: i64,
    pub ai_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let port: u16 = optional_env("PORT", 8080)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            sendgrid_api_key: require_env("SENDGRID_API_KEY")?,
            mail_default_sender: require_env("MAIL_DEFAULT_SENDER")?,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            port,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            tab_switch_limit: optional_env("TAB_SWITCH_LIMIT", 3)?,
            tab_switch_debounce_ms: bounded(
                "TAB_SWITCH_DEBOUNCE_MS",
                optional_env("TAB_SWITCH_DEBOUNCE_MS", 1000)?,
                MAX_DEBOUNCE_MS,
            )?,
            session_max_age_secs: bounded(
                "SESSION_MAX_AGE_SECS",
                optional_env("SESSION_MAX_AGE_SECS", 7200)?,
                MAX_SESSION_AGE_SECS,
            )?,
            ai_timeout_secs: optional_env("AI_TIMEOUT_SECS", 30)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .ok()
        .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
}

/// Rejects values above `max`, which also keeps them in `i64` range.
fn bounded(key: &str, value: u64, max: u64) -> Result<i64> {
    if value > max {
        bail!("{key} must be at most {max}, got {value}");
    }
    Ok(i64::try_from(value)?)
}
