//! HTTP backend for the room authority using `reqwest`.
//!
//! [`HttpRoomApi`] maps the [`RoomApi`] trait onto the authority's REST
//! surface: JSON request and response bodies, the viewer's `playerId` as a
//! query parameter where the authority expects one, and uniform treatment of
//! every non-2xx response as a failure — no status-code-specific handling.
//!
//! # Feature gate
//!
//! This module is only available when the `backend-http` feature is enabled
//! (it is enabled by default).

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::api::RoomApi;
use crate::error::{CardSpyError, Result};
use crate::protocol::{JoinedRoom, RoomSnapshot, RoomState};

/// A [`RoomApi`] implementation speaking HTTP+JSON to the room authority.
///
/// # Construction
///
/// ```rust
/// use card_spy_client::HttpRoomApi;
///
/// // A trailing slash on the base URL is tolerated.
/// let api = HttpRoomApi::new("https://rooms.example.com/");
/// ```
///
/// For custom TLS, proxies, or timeouts, build the `reqwest::Client`
/// yourself and use [`HttpRoomApi::with_client`].
#[derive(Debug, Clone)]
pub struct HttpRoomApi {
    base: String,
    http: reqwest::Client,
}

impl HttpRoomApi {
    /// Create a backend targeting the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a backend with a caller-supplied `reqwest::Client`.
    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        Self { base, http }
    }

    /// Base URL this backend targets, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Check the response status and decode the JSON body.
    ///
    /// Every non-success status maps to [`CardSpyError::Api`] with the raw
    /// body as the message.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CardSpyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| CardSpyError::Request(e.to_string()))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<T> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(pair) = query {
            request = request.query(&[pair]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| CardSpyError::Request(e.to_string()))?;
        Self::decode(response).await
    }
}

#[async_trait]
impl RoomApi for HttpRoomApi {
    async fn create_room(&self, name: &str) -> Result<JoinedRoom> {
        tracing::debug!("creating room");
        self.post_json("/rooms", None, &serde_json::json!({ "name": name }))
            .await
    }

    async fn join_room(&self, code: &str, name: &str) -> Result<JoinedRoom> {
        tracing::debug!(room = %code, "joining room");
        self.post_json(
            &format!("/rooms/{code}/join"),
            None,
            &serde_json::json!({ "name": name }),
        )
        .await
    }

    async fn start_round(
        &self,
        code: &str,
        player_id: &str,
        spy_count: u32,
    ) -> Result<RoomSnapshot> {
        tracing::debug!(room = %code, spy_count, "starting round");
        self.post_json(
            &format!("/rooms/{code}/start"),
            Some(("playerId", player_id)),
            &serde_json::json!({ "spyCount": spy_count }),
        )
        .await
    }

    async fn end_round(&self, code: &str, player_id: &str) -> Result<RoomSnapshot> {
        tracing::debug!(room = %code, "ending round");
        self.post_json(
            &format!("/rooms/{code}/end"),
            None,
            &serde_json::json!({ "playerId": player_id }),
        )
        .await
    }

    async fn reset_round(&self, code: &str, player_id: &str) -> Result<RoomSnapshot> {
        tracing::debug!(room = %code, "resetting round");
        self.post_json(
            &format!("/rooms/{code}/reset"),
            None,
            &serde_json::json!({ "playerId": player_id }),
        )
        .await
    }

    async fn leave_room(&self, code: &str, player_id: &str) -> Result<()> {
        tracing::debug!(room = %code, "leaving room");
        let response = self
            .http
            .post(self.url(&format!("/rooms/{code}/leave")))
            .json(&serde_json::json!({ "playerId": player_id }))
            .send()
            .await
            .map_err(|e| CardSpyError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CardSpyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        // The ack body carries nothing the client uses.
        Ok(())
    }

    async fn fetch_state(&self, code: &str, player_id: Option<&str>) -> Result<RoomState> {
        let mut request = self.http.get(self.url(&format!("/rooms/{code}/state")));
        if let Some(pid) = player_id {
            request = request.query(&[("playerId", pid)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| CardSpyError::Request(e.to_string()))?;
        Self::decode(response).await
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpRoomApi::new("https://rooms.example.com/");
        assert_eq!(api.base_url(), "https://rooms.example.com");
        assert_eq!(api.url("/rooms"), "https://rooms.example.com/rooms");
    }

    #[test]
    fn base_url_without_trailing_slash_is_unchanged() {
        let api = HttpRoomApi::new("http://localhost:8000");
        assert_eq!(api.url("/rooms/AB12/state"), "http://localhost:8000/rooms/AB12/state");
    }

    #[tokio::test]
    async fn request_to_unreachable_host_is_a_request_error() {
        // Port 1 on localhost refuses connections.
        let api = HttpRoomApi::new("http://127.0.0.1:1");
        let err = api.create_room("Ann").await.unwrap_err();
        assert!(matches!(err, CardSpyError::Request(_)));
    }

    #[test]
    fn http_room_api_is_send_and_sync() {
        fn assert_bounds<T: Send + Sync>() {}
        assert_bounds::<HttpRoomApi>();
    }
}
