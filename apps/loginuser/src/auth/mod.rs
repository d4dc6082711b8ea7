//! # Auth Module
//!
//! Binds the authenticated user of a request to a handler parameter.
//!
//! Two pieces cooperate:
//! - [`resolve_identity`] (middleware) resolves the presented credential and
//!   stores a [`Principal`](loginuser_core::Principal) in the request
//!   extensions.
//! - [`LoginUser`] (extractor) hands that principal to the handler.
//!
//! ```rust,no_run
//! use axum::{Router, middleware, routing::get};
//! use loginuser::auth::{AuthState, LoginUser, resolve_identity};
//! use loginuser_core::{FailurePolicy, MemoryStore, Resolver, SessionPolicy};
//! use std::sync::Arc;
//!
//! async fn hello(login: LoginUser) -> String {
//!     format!("Hello, {}", login.display_name())
//! }
//!
//! let resolver = Resolver::new(Arc::new(MemoryStore::default()), SessionPolicy::default());
//! let auth = AuthState::new(resolver, "SESSION", FailurePolicy::Anonymous);
//! let app: Router = Router::new()
//!     .route("/", get(hello))
//!     .layer(middleware::from_fn_with_state(auth, resolve_identity));
//! ```

mod credential;
mod extract;
mod middleware;

pub use credential::{
    DEFAULT_COOKIE_NAME, bearer_token, clear_session_cookie, cookie_value, credential_from_headers,
    session_cookie,
};
pub use extract::{LoginUser, RequireLogin};
pub use middleware::{AuthState, resolve_identity};

use loginuser_core::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in whole seconds.
///
/// A clock set before 1970 reads as the epoch.
pub fn now() -> Timestamp {
    Timestamp(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0),
    )
}
