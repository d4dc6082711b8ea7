//! Identity resolution middleware.
//!
//! Runs before every handler: finds the presented credential, resolves it
//! and leaves the resulting [`Principal`] in the request extensions, where
//! the [`LoginUser`](super::LoginUser) extractor picks it up.

use super::credential::credential_from_headers;
use super::now;
use crate::api::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use loginuser_core::{FailurePolicy, Principal, Resolver};
use std::sync::Arc;

/// Shared state for [`resolve_identity`].
#[derive(Debug, Clone)]
pub struct AuthState {
    resolver: Resolver,
    cookie_name: Arc<str>,
    failure_policy: FailurePolicy,
}

impl AuthState {
    pub fn new(
        resolver: Resolver,
        cookie_name: impl Into<Arc<str>>,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            resolver,
            cookie_name: cookie_name.into(),
            failure_policy,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }
}

/// Resolve the request's identity and attach it as a [`Principal`].
///
/// Under [`FailurePolicy::Anonymous`] a bad credential is logged and the
/// request continues anonymously. Under [`FailurePolicy::Reject`] it is
/// answered with `401`. A failing store always answers `503`.
pub async fn resolve_identity(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = credential_from_headers(request.headers(), auth.cookie_name());
    let outcome = auth.resolver.resolve(credential.as_ref(), now());

    if let (Err(err), Some(credential)) = (&outcome, &credential) {
        if err.is_credential_failure() {
            tracing::debug!(
                source = %credential.source(),
                reason = err.kind(),
                policy = ?auth.failure_policy,
                "credential did not resolve"
            );
        } else {
            tracing::error!(error = %err, "session store failure during identity resolution");
        }
    }

    let principal: Principal = auth.failure_policy.apply(outcome)?;
    if let Some(user) = principal.user() {
        tracing::trace!(user = %user.email, "request authenticated");
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
