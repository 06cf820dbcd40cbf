//! Deterministic session-key derivation.
//!
//! Two clients (the student's and the coach's) each compute the key from
//! their own (self, partner) pair without any coordination round-trip, so
//! the derivation must be commutative and fully deterministic: sort the two
//! ids by byte order and join them with a separator that cannot appear
//! inside a valid participant id.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::session::SessionError;

/// Separator between the two sorted participant ids.
///
/// Excluded from [`ID_PATTERN`], so it is unrepresentable inside an id.
pub const KEY_SEPARATOR: char = ':';

/// Maximum session-key length accepted by the communications platform.
pub const MAX_KEY_LEN: usize = 64;

/// Allowed participant-id character class.
const ID_PATTERN: &str = r"^[A-Za-z0-9@._-]+$";

fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ID_PATTERN).expect("id pattern is valid"))
}

/// A derived session key shared by exactly one pair of participants.
///
/// Never stored; recomputed fresh from the pair each time it is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Derive the session key for an unordered pair of participant ids.
    ///
    /// Commutative: `derive(a, b)` and `derive(b, a)` yield the same key.
    /// Self-pairing is rejected; there are no self-sessions.
    pub fn derive(id_a: &str, id_b: &str) -> Result<Self, SessionError> {
        validate_participant_id(id_a)?;
        validate_participant_id(id_b)?;

        if id_a == id_b {
            return Err(SessionError::InvalidIdentifier(format!(
                "cannot pair participant '{id_a}' with itself"
            )));
        }

        let (lo, hi) = if id_a <= id_b { (id_a, id_b) } else { (id_b, id_a) };
        let key = format!("{lo}{KEY_SEPARATOR}{hi}");

        if key.len() > MAX_KEY_LEN {
            return Err(SessionError::InvalidIdentifier(format!(
                "derived key exceeds {MAX_KEY_LEN} bytes ({} bytes)",
                key.len()
            )));
        }

        Ok(Self(key))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a participant id against the platform's identifier constraints.
///
/// Rejected before any network call: empty ids and ids containing characters
/// outside the allowed class (which includes anything that could collide
/// with the key separator).
pub fn validate_participant_id(id: &str) -> Result<(), SessionError> {
    if id.is_empty() {
        return Err(SessionError::InvalidIdentifier(
            "participant id is empty".to_string(),
        ));
    }

    if !id_regex().is_match(id) {
        return Err(SessionError::InvalidIdentifier(format!(
            "participant id '{id}' contains characters outside {ID_PATTERN}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_commutative() {
        let pairs = [
            ("u1", "u2"),
            ("alice", "bob"),
            ("a-1", "a-2"),
            ("coach@example.com", "student@example.com"),
        ];
        for (a, b) in pairs {
            assert_eq!(
                SessionKey::derive(a, b).unwrap(),
                SessionKey::derive(b, a).unwrap()
            );
        }
    }

    #[test]
    fn test_derive_sorted_join() {
        let key = SessionKey::derive("u1", "u2").unwrap();
        assert_eq!(key.as_str(), "u1:u2");
        // Reversed input order converges on the identical string.
        assert_eq!(SessionKey::derive("u2", "u1").unwrap().as_str(), "u1:u2");
    }

    #[test]
    fn test_derive_is_deterministic() {
        let first = SessionKey::derive("abc", "xyz").unwrap();
        for _ in 0..10 {
            assert_eq!(SessionKey::derive("abc", "xyz").unwrap(), first);
        }
    }

    #[test]
    fn test_self_pairing_is_rejected_without_panic() {
        let result = SessionKey::derive("u1", "u1");
        assert!(matches!(result, Err(SessionError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_empty_id_is_rejected() {
        assert!(matches!(
            SessionKey::derive("", "x"),
            Err(SessionError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            SessionKey::derive("x", ""),
            Err(SessionError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_separator_in_id_is_rejected() {
        assert!(matches!(
            SessionKey::derive("u1:evil", "u2"),
            Err(SessionError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_whitespace_and_unicode_rejected() {
        assert!(SessionKey::derive("u 1", "u2").is_err());
        assert!(SessionKey::derive("ü1", "u2").is_err());
    }

    #[test]
    fn test_oversized_key_is_rejected_not_truncated() {
        let a = "a".repeat(40);
        let b = "b".repeat(40);
        let result = SessionKey::derive(&a, &b);
        assert!(matches!(result, Err(SessionError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_key_at_length_limit_is_accepted() {
        // 31 + 1 + 32 = 64 bytes exactly.
        let a = "a".repeat(31);
        let b = "b".repeat(32);
        let key = SessionKey::derive(&a, &b).unwrap();
        assert_eq!(key.as_str().len(), MAX_KEY_LEN);
    }
}
