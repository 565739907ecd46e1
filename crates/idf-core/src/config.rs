use std::{env, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,

    // Lookups
    pub lookup_timeout: Duration,

    // Rate limiting
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,

    // Moderation
    pub default_mute: Duration,
}

impl Config {
    /// Load from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        // Existing variables win over the file.
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!("failed to read .env: {e}"))),
        }

        Self::from_source(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| get("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("BOT_TOKEN environment variable is required".to_string())
            })?;

        let lookup_timeout =
            Duration::from_millis(parse_u64(get("LOOKUP_TIMEOUT_MS")).unwrap_or(10_000).max(1));

        let rate_limit_enabled = parse_bool(get("RATE_LIMIT_ENABLED")).unwrap_or(true);
        let rate_limit_requests = parse_u32(get("RATE_LIMIT_REQUESTS")).unwrap_or(20).max(1);
        let rate_limit_window =
            Duration::from_secs(parse_u64(get("RATE_LIMIT_WINDOW")).unwrap_or(60).max(1));

        let default_mute_minutes = parse_u64(get("DEFAULT_MUTE_MINUTES")).unwrap_or(60).max(1);
        let default_mute = Duration::from_secs(default_mute_minutes.saturating_mul(60));

        Ok(Self {
            telegram_bot_token,
            lookup_timeout,
            rate_limit_enabled,
            rate_limit_requests,
            rate_limit_window,
            default_mute,
        })
    }
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_u32(v: Option<String>) -> Option<u32> {
    v.and_then(|s| s.trim().parse::<u32>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.trim().to_string())
    }
}
