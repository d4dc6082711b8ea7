//! Pulling a session credential out of request headers.
//!
//! Two carriers are recognised:
//! - `Authorization: Bearer <session id>`
//! - a cookie named after the configured session cookie
//!
//! The bearer header wins when both are present.

use axum::http::{HeaderMap, header};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use loginuser_core::{Credential, SessionId};

/// Session cookie name used when none is configured.
pub const DEFAULT_COOKIE_NAME: &str = "SESSION";

/// Find the credential presented with a request, if any.
pub fn credential_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<Credential> {
    if let Some(token) = bearer_token(headers) {
        return Some(Credential::Bearer(token.to_owned()));
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| cookie_value(value, cookie_name))
        .map(Credential::Cookie)
}

/// The token of an `Authorization: Bearer` header.
///
/// The scheme is case-insensitive. Other schemes and empty tokens yield
/// `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Look up `name` in a `Cookie` header value.
///
/// Pairs that do not parse are skipped, so one broken cookie cannot hide
/// the session. Surrounding double quotes are dropped and an empty value
/// counts as absent.
pub fn cookie_value(header_value: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header_value)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_owned())
        .filter(|value| !value.is_empty())
}

fn base_cookie(name: &str, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name.to_owned(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// `Set-Cookie` value that installs a session cookie.
pub fn session_cookie(name: &str, id: &SessionId, max_age_secs: u64) -> String {
    let secs = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
    base_cookie(name, id.to_string(), Duration::seconds(secs)).to_string()
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(name: &str) -> String {
    base_cookie(name, String::new(), Duration::ZERO).to_string()
}
