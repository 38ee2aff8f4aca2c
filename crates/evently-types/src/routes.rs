//! Path classification consumed by the page route guard.
//!
//! A trailing `/*` on a pattern matches the prefix itself and anything below it.

/// Pages anyone may visit.
pub const PUBLIC_ROUTES: &[&str] = &[
    "/",
    "/events",
    "/events/*",
    "/forgot-password",
    "/reset-password/*",
];

/// Pages that only make sense for anonymous visitors.
pub const AUTH_ROUTES: &[&str] = &["/login", "/register"];

/// API routes under this prefix handle authentication themselves.
pub const API_AUTH_PREFIX: &str = "/api/auth";

pub const DEFAULT_LOGIN_REDIRECT: &str = "/";

pub const LOGIN_PAGE: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Under [`API_AUTH_PREFIX`].
    ApiAuth,
    /// Any other `/api` route.
    Api,
    /// Listed in [`AUTH_ROUTES`].
    AuthOnly,
    /// Listed in [`PUBLIC_ROUTES`].
    Public,
    /// Everything else needs a session.
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

pub fn classify(path: &str) -> RouteKind {
    if has_prefix(path, API_AUTH_PREFIX) {
        RouteKind::ApiAuth
    } else if has_prefix(path, "/api") {
        RouteKind::Api
    } else if AUTH_ROUTES.iter().any(|p| matches(p, path)) {
        RouteKind::AuthOnly
    } else if PUBLIC_ROUTES.iter().any(|p| matches(p, path)) {
        RouteKind::Public
    } else {
        RouteKind::Protected
    }
}

/// What the page guard should do for `path` given whether the visitor has a session.
pub fn guard(path: &str, logged_in: bool) -> GuardDecision {
    match classify(path) {
        RouteKind::AuthOnly if logged_in => GuardDecision::Redirect(DEFAULT_LOGIN_REDIRECT),
        RouteKind::Protected if !logged_in => GuardDecision::Redirect(LOGIN_PAGE),
        _ => GuardDecision::Allow,
    }
}

fn matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(prefix) => has_prefix(path, prefix),
        None => path == pattern,
    }
}

/// Segment-aware prefix test: `/events` matches `/events/1` but not `/eventsx`.
fn has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
