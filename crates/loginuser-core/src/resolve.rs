//! # Resolve Module
//!
//! Turns the credential presented with a request into a [`Principal`].
//!
//! The outcome is deliberately split in two steps:
//! - [`Resolver::resolve`] reports exactly what happened, including every
//!   failure mode.
//! - [`FailurePolicy::apply`] decides whether a credential failure becomes
//!   an anonymous principal or a rejected request.
//!
//! Store failures are never turned into anonymity.

use crate::error::{ResolveError, StoreError};
use crate::principal::{Principal, SessionUser};
use crate::session::{DEFAULT_TTL_SECS, SessionId, SessionRecord, Timestamp};
use crate::store::SessionStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// CREDENTIAL
// =============================================================================

/// Where a credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Bearer,
    Cookie,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bearer => "bearer",
            Self::Cookie => "cookie",
        })
    }
}

/// A raw, unverified session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    Cookie(String),
}

impl Credential {
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Bearer(raw) | Self::Cookie(raw) => raw,
        }
    }

    #[must_use]
    pub fn source(&self) -> CredentialSource {
        match self {
            Self::Bearer(_) => CredentialSource::Bearer,
            Self::Cookie(_) => CredentialSource::Cookie,
        }
    }
}

// =============================================================================
// FAILURE POLICY
// =============================================================================

/// What to do when a credential is present but does not resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Treat the request as anonymous.
    #[default]
    Anonymous,
    /// Refuse the request.
    Reject,
}

impl FailurePolicy {
    /// Fold a resolution outcome into the principal the handler will see.
    ///
    /// Returns the error only when the request must be refused.
    pub fn apply(
        self,
        outcome: Result<Principal, ResolveError>,
    ) -> Result<Principal, ResolveError> {
        match outcome {
            Ok(principal) => Ok(principal),
            Err(err) if err.is_credential_failure() && self == Self::Anonymous => {
                Ok(Principal::Anonymous)
            }
            Err(err) => Err(err),
        }
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Session lifetime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Lifetime of a fresh session, and the extension granted on use when
    /// `sliding` is on.
    pub ttl_secs: u64,
    /// Extend the expiry on every successful resolution.
    pub sliding: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            sliding: true,
        }
    }
}

/// Resolves credentials against a [`SessionStore`].
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn SessionStore>,
    policy: SessionPolicy,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("sessions", &self.store.len().ok())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Resolver {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, policy: SessionPolicy) -> Self {
        Self { store, policy }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    #[must_use]
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Resolve an optional credential at time `now`.
    ///
    /// No credential is not an error: it is the anonymous principal.
    /// An expired session is removed from the store before reporting
    /// [`ResolveError::Expired`]. With sliding expiry, a session revoked
    /// between lookup and renewal is reported as unknown.
    pub fn resolve(
        &self,
        credential: Option<&Credential>,
        now: Timestamp,
    ) -> Result<Principal, ResolveError> {
        let Some(credential) = credential else {
            return Ok(Principal::Anonymous);
        };

        let id = SessionId::parse(credential.raw())?;
        let record = self.store.load(&id)?.ok_or(ResolveError::UnknownSession)?;

        if record.is_expired(now) {
            self.store.remove(&id)?;
            return Err(ResolveError::Expired);
        }

        if !self.policy.sliding {
            return Ok(Principal::Authenticated(record.user));
        }

        let renewed = self
            .store
            .renew(&id, now, self.policy.ttl_secs)?
            .ok_or(ResolveError::UnknownSession)?;
        Ok(Principal::Authenticated(renewed.user))
    }

    /// Create and store a fresh session for `user`.
    pub fn issue(&self, user: SessionUser, now: Timestamp) -> Result<SessionRecord, StoreError> {
        let record = SessionRecord::issue(SessionId::generate(), user, now, self.policy.ttl_secs);
        self.store.save(record.clone())?;
        Ok(record)
    }

    /// Drop a session. Returns whether it existed.
    pub fn revoke(&self, id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.store.remove(id)?.is_some())
    }
}

// =============================================================================
// TESTS
// =============================================================================
