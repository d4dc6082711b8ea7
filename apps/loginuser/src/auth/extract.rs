//! Handler-side extractors for the current user.

use crate::api::ApiError;
use axum::{extract::FromRequestParts, http::request::Parts};
use loginuser_core::{Principal, SessionUser};
use std::convert::Infallible;

/// The user of the current request, or `None` when anonymous.
///
/// Put it in a handler's parameter list and the user resolved by
/// [`resolve_identity`](super::resolve_identity) is bound to it before the
/// handler body runs. Extraction never fails: a request without a resolved
/// user, including one that never went through the identity layer, yields
/// `LoginUser(None)`.
///
/// ```rust,no_run
/// use loginuser::auth::LoginUser;
///
/// async fn index(LoginUser(user): LoginUser) -> String {
///     match user {
///         Some(user) => format!("Hello, {}", user.name),
///         None => "Hello, anonymous".to_owned(),
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginUser(pub Option<SessionUser>);

impl LoginUser {
    pub fn user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_none()
    }

    /// The user's name, or `"anonymous"`.
    pub fn display_name(&self) -> &str {
        self.0.as_ref().map_or("anonymous", |user| user.name.as_str())
    }
}

impl<S> FromRequestParts<S> for LoginUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(principal) => Ok(Self(principal.user().cloned())),
            None => {
                tracing::debug!(
                    path = %parts.uri.path(),
                    "no resolved principal on request, is the identity layer installed?"
                );
                Ok(Self(None))
            }
        }
    }
}

/// Like [`LoginUser`], but refuses anonymous requests with `401`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireLogin(pub SessionUser);

impl<S> FromRequestParts<S> for RequireLogin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let LoginUser(user) = match LoginUser::from_request_parts(parts, state).await {
            Ok(login) => login,
            Err(never) => match never {},
        };
        user.map(Self).ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    fn parts_with(principal: Option<Principal>) -> Parts {
        let (mut parts, ()) = Request::builder()
            .uri("/anything")
            .body(())
            .unwrap()
            .into_parts();
        if let Some(principal) = principal {
            parts.extensions.insert(principal);
        }
        parts
    }

    fn alice() -> SessionUser {
        SessionUser::new("Alice", "alice@example.com")
    }

    #[tokio::test]
    async fn login_user_reads_authenticated_principal() {
        let mut parts = parts_with(Some(Principal::Authenticated(alice())));
        let login = LoginUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(login.user(), Some(&alice()));
        assert_eq!(login.display_name(), "Alice");
    }

    #[tokio::test]
    async fn login_user_is_none_for_anonymous() {
        let mut parts = parts_with(Some(Principal::Anonymous));
        let login = LoginUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(login.is_anonymous());
        assert_eq!(login.display_name(), "anonymous");
    }

    #[tokio::test]
    async fn login_user_without_middleware_is_none() {
        let mut parts = parts_with(None);
        let login = LoginUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(login, LoginUser(None));
    }

    #[tokio::test]
    async fn require_login_accepts_user() {
        let mut parts = parts_with(Some(Principal::Authenticated(alice())));
        let RequireLogin(user) = RequireLogin::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(user, alice());
    }

    #[tokio::test]
    async fn require_login_rejects_anonymous() {
        let mut parts = parts_with(Some(Principal::Anonymous));
        let rejection = RequireLogin::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
