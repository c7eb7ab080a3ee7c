use std::time::Duration;

use anyhow::{Context, Result};

use crate::acquisition::browser::BrowserSettings;
use crate::acquisition::page_fetcher::FetchSettings;

/// Default Bright Data dataset for LinkedIn person profiles.
pub const DEFAULT_PROFILE_DATASET: &str = "gd_l1viktl72bvl7bjuj0";

/// Default cap on resume upload request bodies (10 MiB).
pub const DEFAULT_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Profile lookup is disabled when unset.
    pub bright_data_api_key: Option<String>,
    pub bright_data_dataset_id: String,
    pub port: u16,
    pub rust_log: String,
    pub fetch: FetchSettings,
    pub browser: BrowserSettings,
    /// Per-worker bound enforced by the aggregator. `None` disables it.
    pub generation_deadline: Option<Duration>,
    /// Body limit for the multipart upload routes.
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let fetch = FetchSettings {
            timeout: Duration::from_secs(parse_env("FETCH_TIMEOUT_SECS", 10)?),
            ..FetchSettings::default()
        };

        let browser = BrowserSettings {
            chrome_executable: optional_env("CHROME_EXECUTABLE").map(Into::into),
            ready_timeout: Duration::from_secs(parse_env("PAGE_READY_TIMEOUT_SECS", 20)?),
            settle_delay: Duration::from_millis(parse_env("PAGE_SETTLE_MS", 2000)?),
            ..BrowserSettings::default()
        };

        let deadline_secs: u64 = parse_env("GENERATION_DEADLINE_SECS", 120)?;

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            bright_data_api_key: optional_env("BRIGHT_DATA_API_KEY"),
            bright_data_dataset_id: optional_env("BRIGHT_DATA_DATASET_ID")
                .unwrap_or_else(|| DEFAULT_PROFILE_DATASET.to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            fetch,
            browser,
            generation_deadline: (deadline_secs > 0).then(|| Duration::from_secs(deadline_secs)),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_UPLOAD_LIMIT)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns the variable's value, treating blank values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("OUTREACH_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("OUTREACH_TEST_GARBAGE_PORT", "eighty");
        let result: Result<u16> = parse_env("OUTREACH_TEST_GARBAGE_PORT", 8080);
        assert!(result.is_err());
        std::env::remove_var("OUTREACH_TEST_GARBAGE_PORT");
    }

    #[test]
    fn test_upload_limit_override() {
        assert!(DEFAULT_UPLOAD_LIMIT > 2 * 1024 * 1024);
        std::env::set_var("OUTREACH_TEST_UPLOAD_BYTES", "4194304");
        let limit: usize =
            parse_env("OUTREACH_TEST_UPLOAD_BYTES", DEFAULT_UPLOAD_LIMIT).unwrap();
        assert_eq!(limit, 4 * 1024 * 1024);
        std::env::remove_var("OUTREACH_TEST_UPLOAD_BYTES");
    }

    #[test]
    fn test_optional_env_treats_blank_as_unset() {
        std::env::set_var("OUTREACH_TEST_BLANK_KEY", "   ");
        assert!(optional_env("OUTREACH_TEST_BLANK_KEY").is_none());
        std::env::remove_var("OUTREACH_TEST_BLANK_KEY");
    }
}
