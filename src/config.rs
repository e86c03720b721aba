use anyhow::{Context, Result};
use reqwest::Url;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to CodeMate.Server 🚀";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub log_level: String,
    pub request_timeout: Duration,
    pub default_working_directory: String,
    pub default_terminal_height: f64,
    pub welcome_message: String,
    /// `None` disables the metrics poller.
    pub stats_poll_interval: Option<Duration>,
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).context(format!("Invalid CODEMATE_API_URL: {}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("CODEMATE_API_URL must use http or https, got '{}'", other),
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let api_url = parse_api_url(&var("CODEMATE_API_URL", DEFAULT_API_URL))?;

        let log_level = var("LOG_LEVEL", "info").to_lowercase();
        if !matches!(log_level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            warn!(log_level = %log_level, "Unknown LOG_LEVEL, falling back to info");
        }

        let request_timeout_ms = var("REQUEST_TIMEOUT_MS", "35000")
            .parse::<u64>()
            .context("Invalid REQUEST_TIMEOUT_MS")?;
        if request_timeout_ms == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_MS must be greater than zero");
        }

        let default_working_directory = var("DEFAULT_WORKING_DIRECTORY", ".");

        let default_terminal_height = var("DEFAULT_TERMINAL_HEIGHT", "400")
            .parse::<f64>()
            .context("Invalid DEFAULT_TERMINAL_HEIGHT")?;
        if !(default_terminal_height.is_finite() && default_terminal_height > 0.0) {
            anyhow::bail!(
                "DEFAULT_TERMINAL_HEIGHT must be a positive number, got {}",
                default_terminal_height
            );
        }

        let welcome_message = var("WELCOME_MESSAGE", DEFAULT_WELCOME_MESSAGE);

        let stats_poll_interval_ms = var("STATS_POLL_INTERVAL_MS", "2000")
            .parse::<u64>()
            .context("Invalid STATS_POLL_INTERVAL_MS")?;
        let stats_poll_interval =
            (stats_poll_interval_ms > 0).then(|| Duration::from_millis(stats_poll_interval_ms));

        Ok(Config {
            api_url,
            log_level,
            request_timeout: Duration::from_millis(request_timeout_ms),
            default_working_directory,
            default_terminal_height,
            welcome_message,
            stats_poll_interval,
        })
    }
}
