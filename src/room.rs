//! Resolution of viewer-facing room ids to internal room ids.
//!
//! Rooms can be reached by a short vanity id; the broadcast handshake needs
//! the long internal id returned by the room info endpoint.

use serde::Serialize;
use serde_json::Value;

use crate::config::api_base_url_from_env;

const USER_AGENT: &str = concat!("danmaku/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("room api returned code {code}: {message}")]
    Api { code: i64, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
}

/// Room record from the info endpoint. Only `room_id` is required.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    pub room_id: u64,
    pub short_id: Option<u64>,
    pub uid: Option<u64>,
    pub live_status: Option<u8>,
    pub title: Option<String>,
}

/// HTTP client for the room info endpoint.
pub struct RoomLookup {
    http: reqwest::Client,
    base_url: String,
}

impl RoomLookup {
    /// Build a lookup against `base_url` (e.g. `"https://api.live.bilibili.com"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Build a lookup against `DANMAKU_API_BASE_URL` or the public API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, LookupError> {
        Self::new(api_base_url_from_env())
    }

    /// Fetch the room record for `raw_id`.
    ///
    /// # Errors
    ///
    /// Returns HTTP errors, [`LookupError::Api`] for a non-zero API code, and
    /// [`LookupError::MissingField`] when the record has no `room_id`.
    pub async fn info(&self, raw_id: u64) -> Result<RoomInfo, LookupError> {
        let url = format!("{}/room/v1/Room/get_info?room_id={raw_id}", self.base_url);
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        parse_room_info(&body)
    }

    /// Resolve `raw_id` to the internal id the handshake needs.
    ///
    /// # Errors
    ///
    /// Same as [`RoomLookup::info`].
    pub async fn resolve(&self, raw_id: u64) -> Result<u64, LookupError> {
        let info = self.info(raw_id).await?;
        tracing::info!(raw_id, room_id = info.room_id, "room: resolved");
        Ok(info.room_id)
    }
}

fn parse_room_info(body: &Value) -> Result<RoomInfo, LookupError> {
    let code = body.get("code").and_then(Value::as_i64).unwrap_or(0);
    if code != 0 {
        let message = body
            .get("message")
            .or_else(|| body.get("msg"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_owned();
        return Err(LookupError::Api { code, message });
    }

    let data = body.get("data").ok_or(LookupError::MissingField("data"))?;
    let room_id = data
        .get("room_id")
        .and_then(Value::as_u64)
        .ok_or(LookupError::MissingField("room_id"))?;

    Ok(RoomInfo {
        room_id,
        short_id: data.get("short_id").and_then(Value::as_u64),
        uid: data.get("uid").and_then(Value::as_u64),
        live_status: data
            .get("live_status")
            .and_then(Value::as_u64)
            .and_then(|v| u8::try_from(v).ok()),
        title: data.get("title").and_then(Value::as_str).map(ToOwned::to_owned),
    })
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
