//! # Session Module
//!
//! Session identifiers, wall-clock timestamps and the record a store keeps
//! per session.
//!
//! Time never comes from a global clock in this crate. Callers pass a
//! [`Timestamp`] in, which keeps expiry checks reproducible in tests.

use crate::error::SessionIdError;
use crate::principal::SessionUser;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a session id in characters.
pub const SESSION_ID_LEN: usize = 32;

/// Default session lifetime: 30 minutes.
pub const DEFAULT_TTL_SECS: u64 = 30 * 60;

// =============================================================================
// SESSION ID
// =============================================================================

/// Opaque session identifier: 32 lower-case hex characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random id (v4 UUID, simple form).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Parse an id presented by a client.
    ///
    /// Upper-case hex is accepted and normalized.
    pub fn parse(raw: &str) -> Result<Self, SessionIdError> {
        if raw.len() != SESSION_ID_LEN {
            return Err(SessionIdError::Length {
                expected: SESSION_ID_LEN,
                actual: raw.len(),
            });
        }
        if let Some(pos) = raw.bytes().position(|b| !b.is_ascii_hexdigit()) {
            return Err(SessionIdError::NotHex(pos));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

// =============================================================================
// TIMESTAMP
// =============================================================================

/// Whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    #[must_use]
    pub fn plus_secs(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    #[must_use]
    pub fn secs_until(self, later: Self) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

// =============================================================================
// SESSION RECORD
// =============================================================================

/// What a store keeps for one live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub user: SessionUser,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub last_seen: Timestamp,
}

impl SessionRecord {
    /// Create a record that lives `ttl_secs` from `now`.
    #[must_use]
    pub fn issue(id: SessionId, user: SessionUser, now: Timestamp, ttl_secs: u64) -> Self {
        Self {
            id,
            user,
            created_at: now,
            expires_at: now.plus_secs(ttl_secs),
            last_seen: now,
        }
    }

    /// A session is expired from its `expires_at` second onwards.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Copy with the expiry pushed to `now + ttl_secs`.
    ///
    /// Never moves `expires_at` backwards.
    #[must_use]
    pub fn renewed(&self, now: Timestamp, ttl_secs: u64) -> Self {
        Self {
            expires_at: self.expires_at.max(now.plus_secs(ttl_secs)),
            last_seen: now,
            ..self.clone()
        }
    }

    /// Seconds left before expiry (zero once expired).
    #[must_use]
    pub fn remaining_secs(&self, now: Timestamp) -> u64 {
        now.secs_until(self.expires_at)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn alice() -> SessionUser {
        SessionUser::new("Alice", "alice@example.com")
    }

    #[test]
    fn generated_ids_are_valid_and_distinct() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), SESSION_ID_LEN);
        assert_eq!(SessionId::parse(a.as_str()), Ok(a));
    }

    #[test]
    fn parse_normalizes_case() {
        let upper = "0123456789ABCDEF0123456789ABCDEF";
        let id = SessionId::parse(upper);
        assert_eq!(
            id.as_ref().map(|i| i.as_str()),
            Ok("0123456789abcdef0123456789abcdef")
        );
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(
            SessionId::parse("abc"),
            Err(SessionIdError::Length {
                expected: SESSION_ID_LEN,
                actual: 3
            })
        );
    }

    #[test]
    fn parse_rejects_non_hex() {
        let raw = "0123456789abcdef0123456789abcdeg";
        assert_eq!(SessionId::parse(raw), Err(SessionIdError::NotHex(31)));
    }

    #[test]
    fn deserialize_validates() {
        let bad: Result<SessionId, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let record = SessionRecord::issue(SessionId::generate(), alice(), Timestamp(100), 10);
        assert!(!record.is_expired(Timestamp(109)));
        assert!(record.is_expired(Timestamp(110)));
        assert_eq!(record.remaining_secs(Timestamp(104)), 6);
        assert_eq!(record.remaining_secs(Timestamp(500)), 0);
    }

    #[test]
    fn renew_pushes_expiry_forward_only() {
        let record = SessionRecord::issue(SessionId::generate(), alice(), Timestamp(100), 100);

        let later = record.renewed(Timestamp(150), 100);
        assert_eq!(later.expires_at, Timestamp(250));
        assert_eq!(later.last_seen, Timestamp(150));
        assert_eq!(later.created_at, Timestamp(100));

        // A shorter ttl must not shrink the session.
        let shorter = record.renewed(Timestamp(150), 10);
        assert_eq!(shorter.expires_at, Timestamp(200));
    }

    #[test]
    fn timestamp_arithmetic_saturates() {
        assert_eq!(Timestamp(u64::MAX).plus_secs(5), Timestamp(u64::MAX));
        assert_eq!(Timestamp(10).secs_until(Timestamp(3)), 0);
    }

    proptest! {
        #[test]
        fn any_hex_string_of_right_length_parses(raw in "[0-9a-fA-F]{32}") {
            let id = SessionId::parse(&raw);
            prop_assert!(id.is_ok());
            if let Ok(id) = id {
                prop_assert_eq!(id.as_str(), raw.to_ascii_lowercase());
            }
        }

        #[test]
        fn parse_never_accepts_other_lengths(raw in "[0-9a-f]{0,64}") {
            prop_assume!(raw.len() != SESSION_ID_LEN);
            prop_assert!(SessionId::parse(&raw).is_err());
        }
    }
}
