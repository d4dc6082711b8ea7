//! # Principal Module
//!
//! The identity that the login-user extractor hands to a handler.
//!
//! A request is either anonymous or carries a [`SessionUser`]. The user
//! payload is a flattened, serializable copy of whatever the login flow
//! stored in the session: it holds no references back into a user database.

use crate::error::UserError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum byte length for `name`, `email` and `picture`.
pub const MAX_FIELD_LEN: usize = 256;

// =============================================================================
// ROLE
// =============================================================================

/// Coarse authorization role attached to a session user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Guest,
    #[default]
    User,
}

impl Role {
    /// Authority key, e.g. `ROLE_USER`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Guest => "ROLE_GUEST",
            Self::User => "ROLE_USER",
        }
    }

    /// Human-readable title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// SESSION USER
// =============================================================================

/// The authenticated user as stored in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl SessionUser {
    /// Create a user with the default role and no picture.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            picture: None,
            role: Role::default(),
        }
    }

    #[must_use]
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Check field constraints.
    ///
    /// `name` and `email` must be non-blank and `email` must contain `@`.
    /// Every field is capped at [`MAX_FIELD_LEN`] bytes.
    pub fn validate(&self) -> Result<(), UserError> {
        check_field("name", &self.name)?;
        check_field("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(UserError::InvalidEmail(self.email.clone()));
        }
        if let Some(picture) = &self.picture
            && picture.len() > MAX_FIELD_LEN
        {
            return Err(UserError::TooLong {
                field: "picture",
                max: MAX_FIELD_LEN,
            });
        }
        Ok(())
    }
}

fn check_field(field: &'static str, value: &str) -> Result<(), UserError> {
    if value.trim().is_empty() {
        return Err(UserError::Empty(field));
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(UserError::TooLong {
            field,
            max: MAX_FIELD_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// PRINCIPAL
// =============================================================================

/// The resolved identity of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user", rename_all = "snake_case")]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(SessionUser),
}

impl Principal {
    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    #[must_use]
    pub fn into_user(self) -> Option<SessionUser> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

impl From<Option<SessionUser>> for Principal {
    fn from(user: Option<SessionUser>) -> Self {
        user.map_or(Self::Anonymous, Self::Authenticated)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_keys() {
        assert_eq!(Role::Guest.key(), "ROLE_GUEST");
        assert_eq!(Role::User.key(), "ROLE_USER");
        assert_eq!(Role::default(), Role::User);
        assert_eq!(Role::Guest.to_string(), "ROLE_GUEST");
    }

    #[test]
    fn role_serializes_upper_case() {
        let json = serde_json::to_string(&Role::Guest).unwrap_or_default();
        assert_eq!(json, "\"GUEST\"");
    }

    #[test]
    fn user_defaults_apply_when_fields_missing() {
        let user: Result<SessionUser, _> =
            serde_json::from_str(r#"{"name":"Alice","email":"alice@example.com"}"#);
        assert!(matches!(
            user,
            Ok(ref u) if u.role == Role::User && u.picture.is_none()
        ));
    }

    #[test]
    fn validate_accepts_well_formed_user() {
        let user = SessionUser::new("Alice", "alice@example.com").with_picture("https://p/a.png");
        assert_eq!(user.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_blank_name() {
        let user = SessionUser::new("   ", "alice@example.com");
        assert_eq!(user.validate(), Err(UserError::Empty("name")));
    }

    #[test]
    fn validate_rejects_email_without_at() {
        let user = SessionUser::new("Alice", "alice.example.com");
        assert!(matches!(user.validate(), Err(UserError::InvalidEmail(_))));
    }

    #[test]
    fn validate_rejects_oversized_picture() {
        let user = SessionUser::new("Alice", "a@b").with_picture("x".repeat(MAX_FIELD_LEN + 1));
        assert_eq!(
            user.validate(),
            Err(UserError::TooLong {
                field: "picture",
                max: MAX_FIELD_LEN
            })
        );
    }

    #[test]
    fn principal_from_option() {
        assert_eq!(Principal::from(None), Principal::Anonymous);
        let user = SessionUser::new("Bob", "bob@example.com");
        let principal = Principal::from(Some(user.clone()));
        assert!(principal.is_authenticated());
        assert_eq!(principal.user(), Some(&user));
        assert_eq!(principal.into_user(), Some(user));
    }
}
