//! HTTP client for the communications platform.
//!
//! Thin wrapper over the platform's documented room endpoints; every method
//! maps 1:1 onto one platform call and carries no business logic. Room
//! creation is idempotent on the platform side: posting an existing room id
//! returns the existing room.

use serde::Deserialize;

use crate::config::PlatformConfig;
use crate::identity::SessionKey;
use crate::session::{Members, SessionError, SessionKind};

/// Client for the communications platform's room API.
#[derive(Debug, Clone)]
pub struct StreamPlatform {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_token: String,
}

/// Platform response for create-or-fetch.
#[derive(Debug, Deserialize)]
struct RoomResponse {
    created: bool,
}

impl StreamPlatform {
    /// Build a client from configuration; `None` when credentials are absent.
    pub fn from_config(config: &PlatformConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        let api_token = config.api_token.clone()?;
        Some(Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            api_token,
        })
    }

    fn room_url(&self, kind: SessionKind, key: &SessionKey) -> String {
        format!(
            "{}/{}/rooms/{}?api_key={}",
            self.base_url,
            kind.as_str(),
            urlencoding::encode(key.as_str()),
            self.api_key
        )
    }

    /// Create-or-fetch the room and register both members.
    ///
    /// Returns whether the room was newly created.
    pub async fn get_or_create(
        &self,
        kind: SessionKind,
        key: &SessionKey,
        members: &Members,
    ) -> Result<bool, SessionError> {
        let body = serde_json::json!({
            "members": members.ids(),
            "created_by": members.self_id,
        });

        let resp = self
            .http
            .post(self.room_url(kind, key))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SessionError::AuthenticationFailed(format!(
                "platform returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(SessionError::SessionCreateFailed(format!(
                "platform returned {status} creating {kind} room '{key}'"
            )));
        }

        let room: RoomResponse = resp.json().await.map_err(|e| {
            SessionError::SessionCreateFailed(format!("unreadable platform response: {e}"))
        })?;
        Ok(room.created)
    }

    /// Transition the participant to active in the room.
    pub async fn join(
        &self,
        kind: SessionKind,
        key: &SessionKey,
        participant_id: &str,
    ) -> Result<(), SessionError> {
        self.membership_call(kind, key, participant_id, "join").await
    }

    /// Transition the participant to inactive and release platform resources.
    pub async fn leave(
        &self,
        kind: SessionKind,
        key: &SessionKey,
        participant_id: &str,
    ) -> Result<(), SessionError> {
        self.membership_call(kind, key, participant_id, "leave").await
    }

    async fn membership_call(
        &self,
        kind: SessionKind,
        key: &SessionKey,
        participant_id: &str,
        action: &str,
    ) -> Result<(), SessionError> {
        let url = format!(
            "{}/{}/rooms/{}/{}?api_key={}",
            self.base_url,
            kind.as_str(),
            urlencoding::encode(key.as_str()),
            action,
            self.api_key
        );
        let body = serde_json::json!({ "participant_id": participant_id });

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SessionError::AuthenticationFailed(format!(
                "platform returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(SessionError::SessionCreateFailed(format!(
                "platform returned {status} for {action} on {kind} room '{key}'"
            )));
        }

        Ok(())
    }
}

/// Classify a transport-level failure.
fn transport_error(e: reqwest::Error) -> SessionError {
    if e.is_connect() || e.is_timeout() {
        SessionError::NetworkUnavailable(e.to_string())
    } else {
        SessionError::SessionCreateFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Router};

    async fn spawn_platform_stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn platform_at(base_url: String) -> StreamPlatform {
        StreamPlatform {
            http: reqwest::Client::new(),
            base_url,
            api_key: "key".to_string(),
            api_token: "token".to_string(),
        }
    }

    fn members() -> Members {
        Members {
            self_id: "u1".to_string(),
            partner_id: "u2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_membership_failure_names_the_transition() {
        let app = Router::new().route(
            "/video/rooms/{key}/join",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let platform = platform_at(spawn_platform_stub(app).await);
        let key = SessionKey::derive("u1", "u2").unwrap();

        let err = platform
            .join(SessionKind::Video, &key, "u1")
            .await
            .unwrap_err();
        match &err {
            SessionError::SessionCreateFailed(msg) => {
                assert!(msg.contains("join"), "message should name the transition: {msg}");
            }
            other => panic!("expected a terminal rejection, got {other:?}"),
        }
        // The rendered error must not claim a creation happened.
        assert!(!err.to_string().contains("creation"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_surfaced_as_authentication_failure() {
        let app = Router::new().route(
            "/video/rooms/{key}",
            post(|| async { StatusCode::UNAUTHORIZED }),
        );
        let platform = platform_at(spawn_platform_stub(app).await);
        let key = SessionKey::derive("u1", "u2").unwrap();

        let err = platform
            .get_or_create(SessionKind::Video, &key, &members())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_platform_is_a_network_error() {
        // Bind then drop to get a local port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let platform = platform_at(format!("http://{addr}"));
        let key = SessionKey::derive("u1", "u2").unwrap();

        let err = platform
            .join(SessionKind::Video, &key, "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NetworkUnavailable(_)));
    }
}
