//! Session initialization against the external communications platform.
//!
//! One conceptual capability covers both room types: video call rooms and
//! chat channels. The backend is selected once at startup — a real HTTP
//! client when platform credentials are configured, or a no-op substitute
//! that lets the rest of the application run unconfigured.

mod handle;
mod null;
mod stream;

pub use handle::{ActiveSession, SessionHandle};
pub use null::NullPlatform;
pub use stream::StreamPlatform;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PlatformConfig;
use crate::identity::SessionKey;

/// Errors surfaced by identity derivation and session initialization.
///
/// Every variant degrades to a visible, user-actionable message; nothing in
/// this module retries automatically.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Derivation input malformed; rejected before any network call.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The client is not authenticated to the platform.
    #[error("platform authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The platform was unreachable; transient, the user may retry.
    #[error("platform unreachable: {0}")]
    NetworkUnavailable(String),

    /// The platform rejected the request; terminal for this attempt. The
    /// message names the operation (create, join, leave).
    #[error("platform rejected the request: {0}")]
    SessionCreateFailed(String),
}

/// The two room types the platform exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// A video call room.
    Video,
    /// A text chat channel.
    Chat,
}

impl SessionKind {
    /// Convert kind to the platform's path segment.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Chat => "chat",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two members registered on a session at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Members {
    /// The calling participant.
    pub self_id: String,
    /// The partner resolved from the assignment relation.
    pub partner_id: String,
}

impl Members {
    /// Both member ids, self first.
    pub fn ids(&self) -> [&str; 2] {
        [&self.self_id, &self.partner_id]
    }
}

/// Session-initializer backend, selected once at startup.
#[derive(Debug, Clone)]
pub enum SessionBackend {
    /// Real communications platform over HTTP.
    Stream(StreamPlatform),
    /// No-op substitute for demo / unconfigured mode.
    Null(NullPlatform),
}

impl SessionBackend {
    /// Pick the backend from configuration.
    ///
    /// Missing credentials select the null backend so the rest of the
    /// application still runs.
    pub fn from_config(config: &PlatformConfig) -> Self {
        match StreamPlatform::from_config(config) {
            Some(platform) => Self::Stream(platform),
            None => {
                tracing::info!("platform credentials absent, using null session backend");
                Self::Null(NullPlatform::default())
            }
        }
    }

    /// Idempotently create-or-fetch a session and register both members.
    ///
    /// A second call with the same key returns a handle to the existing
    /// session (`created() == false`); it never fails with
    /// [`SessionError::SessionCreateFailed`] merely because the session
    /// already exists.
    pub async fn get_or_create(
        &self,
        kind: SessionKind,
        key: &SessionKey,
        members: &Members,
    ) -> Result<SessionHandle, SessionError> {
        let created = match self {
            Self::Stream(platform) => platform.get_or_create(kind, key, members).await?,
            Self::Null(platform) => platform.get_or_create(kind, key, members),
        };

        Ok(SessionHandle::new(
            kind,
            key.clone(),
            members.self_id.clone(),
            created,
            self.clone(),
        ))
    }

    pub(crate) async fn join(
        &self,
        kind: SessionKind,
        key: &SessionKey,
        participant_id: &str,
    ) -> Result<(), SessionError> {
        match self {
            Self::Stream(platform) => platform.join(kind, key, participant_id).await,
            Self::Null(platform) => {
                platform.join(kind, key, participant_id);
                Ok(())
            }
        }
    }

    pub(crate) async fn leave(
        &self,
        kind: SessionKind,
        key: &SessionKey,
        participant_id: &str,
    ) -> Result<(), SessionError> {
        match self {
            Self::Stream(platform) => platform.leave(kind, key, participant_id).await,
            Self::Null(platform) => {
                platform.leave(kind, key, participant_id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members() -> Members {
        Members {
            self_id: "u1".to_string(),
            partner_id: "u2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let backend = SessionBackend::Null(NullPlatform::default());
        let key = SessionKey::derive("u1", "u2").unwrap();

        let first = backend
            .get_or_create(SessionKind::Video, &key, &members())
            .await
            .unwrap();
        assert!(first.created());

        // Second call must not fail and must reference the same session.
        let second = backend
            .get_or_create(SessionKind::Video, &key, &members())
            .await
            .unwrap();
        assert!(!second.created());
        assert_eq!(first.key(), second.key());

        if let SessionBackend::Null(platform) = &backend {
            assert_eq!(platform.session_count(), 1);
            assert_eq!(
                platform.members_of(SessionKind::Video, &key),
                Some(vec!["u1".to_string(), "u2".to_string()])
            );
        }
    }

    #[tokio::test]
    async fn test_video_and_chat_rooms_are_distinct() {
        let backend = SessionBackend::Null(NullPlatform::default());
        let key = SessionKey::derive("u1", "u2").unwrap();

        backend
            .get_or_create(SessionKind::Video, &key, &members())
            .await
            .unwrap();
        let chat = backend
            .get_or_create(SessionKind::Chat, &key, &members())
            .await
            .unwrap();
        assert!(chat.created());

        if let SessionBackend::Null(platform) = &backend {
            assert_eq!(platform.session_count(), 2);
        }
    }

    #[tokio::test]
    async fn test_both_sides_converge_on_one_session() {
        // Each side derives from its own (self, partner) perspective.
        let backend = SessionBackend::Null(NullPlatform::default());
        let student_key = SessionKey::derive("u1", "u2").unwrap();
        let coach_key = SessionKey::derive("u2", "u1").unwrap();

        backend
            .get_or_create(
                SessionKind::Video,
                &student_key,
                &Members {
                    self_id: "u1".to_string(),
                    partner_id: "u2".to_string(),
                },
            )
            .await
            .unwrap();
        let coach_side = backend
            .get_or_create(
                SessionKind::Video,
                &coach_key,
                &Members {
                    self_id: "u2".to_string(),
                    partner_id: "u1".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(!coach_side.created());
        if let SessionBackend::Null(platform) = &backend {
            assert_eq!(platform.session_count(), 1);
        }
    }
}
