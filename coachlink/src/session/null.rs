//! No-op session backend for demo / unconfigured mode.
//!
//! Satisfies the same capability as the real platform client so callers are
//! written once; sessions live in memory, which also makes idempotency and
//! call counts observable in tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::identity::SessionKey;
use crate::session::{Members, SessionKind};

#[derive(Debug, Default)]
struct NullState {
    /// (kind, key) -> member ids, in registration order.
    sessions: HashMap<(SessionKind, String), Vec<String>>,
    /// (kind, key) -> currently joined participant ids.
    joined: HashMap<(SessionKind, String), Vec<String>>,
}

/// In-memory stand-in for the communications platform.
#[derive(Debug, Clone, Default)]
pub struct NullPlatform {
    inner: Arc<Mutex<NullState>>,
}

impl NullPlatform {
    /// Create-or-fetch a session. Returns whether it was newly created.
    pub fn get_or_create(&self, kind: SessionKind, key: &SessionKey, members: &Members) -> bool {
        let mut state = self.inner.lock().expect("null platform lock");
        let slot = (kind, key.as_str().to_string());
        if state.sessions.contains_key(&slot) {
            false
        } else {
            let ids = members.ids().map(String::from).to_vec();
            state.sessions.insert(slot, ids);
            true
        }
    }

    /// Mark a participant as joined. No-op beyond bookkeeping.
    pub fn join(&self, kind: SessionKind, key: &SessionKey, participant_id: &str) {
        let mut state = self.inner.lock().expect("null platform lock");
        let joined = state
            .joined
            .entry((kind, key.as_str().to_string()))
            .or_default();
        if !joined.iter().any(|id| id == participant_id) {
            joined.push(participant_id.to_string());
        }
    }

    /// Mark a participant as left. No-op beyond bookkeeping.
    pub fn leave(&self, kind: SessionKind, key: &SessionKey, participant_id: &str) {
        let mut state = self.inner.lock().expect("null platform lock");
        if let Some(joined) = state.joined.get_mut(&(kind, key.as_str().to_string())) {
            joined.retain(|id| id != participant_id);
        }
    }

    /// Number of sessions ever created.
    pub fn session_count(&self) -> usize {
        self.inner.lock().expect("null platform lock").sessions.len()
    }

    /// Registered members of a session, if it exists.
    pub fn members_of(&self, kind: SessionKind, key: &SessionKey) -> Option<Vec<String>> {
        self.inner
            .lock()
            .expect("null platform lock")
            .sessions
            .get(&(kind, key.as_str().to_string()))
            .cloned()
    }

    /// Currently joined participants of a session.
    pub fn joined_of(&self, kind: SessionKind, key: &SessionKey) -> Vec<String> {
        self.inner
            .lock()
            .expect("null platform lock")
            .joined
            .get(&(kind, key.as_str().to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SessionKey {
        SessionKey::derive("u1", "u2").unwrap()
    }

    #[test]
    fn test_join_and_leave_bookkeeping() {
        let platform = NullPlatform::default();
        let members = Members {
            self_id: "u1".to_string(),
            partner_id: "u2".to_string(),
        };

        assert!(platform.get_or_create(SessionKind::Video, &key(), &members));
        platform.join(SessionKind::Video, &key(), "u1");
        platform.join(SessionKind::Video, &key(), "u1"); // duplicate join collapses
        assert_eq!(platform.joined_of(SessionKind::Video, &key()), vec!["u1"]);

        platform.leave(SessionKind::Video, &key(), "u1");
        assert!(platform.joined_of(SessionKind::Video, &key()).is_empty());
    }

    #[test]
    fn test_leave_without_session_is_harmless() {
        let platform = NullPlatform::default();
        platform.leave(SessionKind::Chat, &key(), "u1");
        assert_eq!(platform.session_count(), 0);
    }
}
