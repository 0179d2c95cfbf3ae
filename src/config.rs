//! Session configuration parsed from environment variables.

use tokio::sync::mpsc;

use frames::DecodedMessage;

/// Public broadcast WebSocket endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://broadcastlv.chat.bilibili.com/sub";
/// Public HTTP API used for room lookups.
pub const DEFAULT_API_BASE_URL: &str = "https://api.live.bilibili.com";
/// Batches buffered in the sink before delivery waits on the consumer.
pub const DEFAULT_SINK_CAPACITY: usize = 64;

/// Connection settings for a [`crate::SessionClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// WebSocket endpoint the session connects to.
    pub endpoint: String,
    /// Number of undelivered batches buffered before the session waits on
    /// the consumer.
    pub sink_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Build session config from environment variables.
    ///
    /// Optional:
    /// - `DANMAKU_ENDPOINT`: default `wss://broadcastlv.chat.bilibili.com/sub`
    /// - `DANMAKU_SINK_CAPACITY`: default 64
    #[must_use]
    pub fn from_env() -> Self {
        let endpoint = std::env::var("DANMAKU_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());

        Self {
            endpoint,
            sink_capacity: env_parse("DANMAKU_SINK_CAPACITY", DEFAULT_SINK_CAPACITY),
        }
    }

    /// Create the bounded channel a session delivers batches into.
    #[must_use]
    pub fn channel(&self) -> (mpsc::Sender<Vec<DecodedMessage>>, mpsc::Receiver<Vec<DecodedMessage>>) {
        mpsc::channel(self.sink_capacity.max(1))
    }
}

/// Base URL for room lookups, from `DANMAKU_API_BASE_URL`.
#[must_use]
pub fn api_base_url_from_env() -> String {
    std::env::var("DANMAKU_API_BASE_URL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
}

/// Parse `key` from the environment, falling back to `default` when unset or
/// invalid.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
