//! # Error Types
//!
//! One error enum per concern. None of these are raised by the login-user
//! extractor itself; they describe failures of the collaborators around it.

use thiserror::Error;

/// A session identifier that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionIdError {
    /// Wrong number of characters.
    #[error("session id must be {expected} characters, got {actual}")]
    Length {
        /// Required length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// A character outside `[0-9a-fA-F]`.
    #[error("session id contains a non-hex character at position {0}")]
    NotHex(usize),
}

/// A user payload that fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} exceeds {max} bytes")]
    TooLong { field: &'static str, max: usize },

    #[error("email address {0:?} is missing '@'")]
    InvalidEmail(String),
}

/// Failures of a [`crate::SessionStore`] backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A writer panicked while holding the store lock.
    #[error("session store lock poisoned")]
    Poisoned,

    /// Backend-specific failure.
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Why a presented credential did not yield an authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("malformed session credential: {0}")]
    Malformed(#[from] SessionIdError),

    #[error("no session matches the presented credential")]
    UnknownSession,

    #[error("session expired")]
    Expired,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// Stable machine-readable kind, used in logs and JSON error bodies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "MalformedCredential",
            Self::UnknownSession => "UnknownSession",
            Self::Expired => "SessionExpired",
            Self::Store(_) => "StoreUnavailable",
        }
    }

    /// Whether the failure is about the credential rather than the backend.
    ///
    /// Only credential failures may be downgraded to an anonymous principal.
    #[must_use]
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Errors while reading a seed document.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid seed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("seed #{index}: {source}")]
    InvalidId {
        index: usize,
        #[source]
        source: SessionIdError,
    },

    #[error("seed #{index}: {source}")]
    InvalidUser {
        index: usize,
        #[source]
        source: UserError,
    },

    #[error("seed #{index}: duplicate session id {id}")]
    Duplicate { index: usize, id: String },

    #[error("seed #{index}: ttl_secs must be greater than zero")]
    ZeroTtl { index: usize },
}
