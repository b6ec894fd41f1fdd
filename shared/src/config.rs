use std::time::Duration;
use tracing::warn;

/// Runtime settings for the cache adapters and the bundled backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Interval handed to the legacy `wait_for_close` while bridging a blocking close.
    pub close_poll_interval: Duration,
    /// Upper bound a caller waits for a cache to finish shutting down.
    pub close_timeout: Duration,
    pub cache_max_entries: Option<u64>,
    pub default_ttl: Option<Duration>,
}

impl Config {
    pub const DEFAULT_CLOSE_POLL_MS: u64 = 100;
    pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 5000;

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let close_poll_ms = parse_or(&lookup, "CONDUIT_CLOSE_POLL_MS", Self::DEFAULT_CLOSE_POLL_MS);
        let close_timeout_ms =
            parse_or(&lookup, "CONDUIT_CLOSE_TIMEOUT_MS", Self::DEFAULT_CLOSE_TIMEOUT_MS);

        Self {
            close_poll_interval: Duration::from_millis(close_poll_ms),
            close_timeout: Duration::from_millis(close_timeout_ms),
            cache_max_entries: parse_opt(&lookup, "CONDUIT_CACHE_MAX_ENTRIES"),
            default_ttl: parse_opt(&lookup, "CONDUIT_DEFAULT_TTL_MS").map(Duration::from_millis),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            close_poll_interval: Duration::from_millis(Self::DEFAULT_CLOSE_POLL_MS),
            close_timeout: Duration::from_millis(Self::DEFAULT_CLOSE_TIMEOUT_MS),
            cache_max_entries: None,
            default_ttl: None,
        }
    }
}

fn parse_or<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    parse_opt(lookup, name).unwrap_or(default)
}

fn parse_opt<F>(lookup: &F, name: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("{} has invalid value '{}', using default", name, raw);
            None
        }
    }
}
