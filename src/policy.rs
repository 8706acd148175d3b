//! Access policy.
//!
//! A pure, per-request decision over `(path, method, session)`. Classification
//! depends on the path and method only; the session is an explicit input to
//! the decision and nothing is remembered between requests.
//!
//! Rules, first match wins:
//!
//! 1. `/admin/**` except the login page: allow with a session, otherwise send
//!    the browser to the login page.
//! 2. `/admin/login`: a signed-in admin is sent away to the admin home,
//!    everyone else sees the form.
//! 3. `/api/**` outside `/api/auth/**` and outside the public allow-list,
//!    with a mutating method: allow with a session, otherwise 401.
//! 4. Everything else is allowed.

use axum::http::Method;

use crate::session::Session;

pub const ADMIN_PREFIX: &str = "/admin";
pub const ADMIN_HOME: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";
pub const API_PREFIX: &str = "/api";
pub const AUTH_PREFIX: &str = "/api/auth";

/// Mutating API routes reachable without a session: contact-form submission.
pub const PUBLIC_WRITE_ALLOW_LIST: &[(&str, &str)] = &[
    ("POST", "/api/enquiries"),
    ("POST", "/api/contact"),
];

/// RouteClass
///
/// What a request is, as far as access control is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    AdminUi,
    AdminLogin,
    AuthInfrastructure,
    PublicWriteApi,
    ProtectedWriteApi,
    ReadApi,
    PublicPage,
}

/// Decision
///
/// Outcome of the policy. The caller turns it into a response: `Allow`
/// proceeds, the redirects become `Location` responses, `Unauthorized` a 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin,
    RedirectAwayFromLogin,
    Unauthorized,
}

/// normalize_path
///
/// Canonical form used for matching: repeated slashes collapsed, `.` and `..`
/// segments resolved (never above the root), no trailing slash.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// True when `path` is `prefix` itself or lies below it.
fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Reads are GET, HEAD and OPTIONS. Anything else, including extension
/// methods, counts as mutating.
pub fn is_mutating(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn is_allow_listed(path: &str, method: &Method) -> bool {
    PUBLIC_WRITE_ALLOW_LIST
        .iter()
        .any(|(allowed_method, allowed_path)| {
            *allowed_method == method.as_str() && *allowed_path == path
        })
}

/// classify
///
/// Maps a request onto its route class. Pure: the same `(path, method)`
/// always yields the same class.
pub fn classify(path: &str, method: &Method) -> RouteClass {
    let path = normalize_path(path);

    if path == LOGIN_PATH {
        return RouteClass::AdminLogin;
    }
    if is_under(&path, ADMIN_PREFIX) {
        return RouteClass::AdminUi;
    }
    if is_under(&path, API_PREFIX) {
        if is_under(&path, AUTH_PREFIX) {
            return RouteClass::AuthInfrastructure;
        }
        if !is_mutating(method) {
            return RouteClass::ReadApi;
        }
        if is_allow_listed(&path, method) {
            return RouteClass::PublicWriteApi;
        }
        return RouteClass::ProtectedWriteApi;
    }
    RouteClass::PublicPage
}

/// decide
///
/// The decision table proper.
pub fn decide(class: RouteClass, authenticated: bool) -> Decision {
    match (class, authenticated) {
        (RouteClass::AdminUi, true) => Decision::Allow,
        (RouteClass::AdminUi, false) => Decision::RedirectToLogin,
        (RouteClass::AdminLogin, true) => Decision::RedirectAwayFromLogin,
        (RouteClass::AdminLogin, false) => Decision::Allow,
        (RouteClass::ProtectedWriteApi, true) => Decision::Allow,
        (RouteClass::ProtectedWriteApi, false) => Decision::Unauthorized,
        (
            RouteClass::AuthInfrastructure
            | RouteClass::PublicWriteApi
            | RouteClass::ReadApi
            | RouteClass::PublicPage,
            _,
        ) => Decision::Allow,
    }
}

/// evaluate
///
/// Classifies the request and applies the decision table for the given session.
pub fn evaluate(path: &str, method: &Method, session: Option<&Session>) -> Decision {
    decide(classify(path, method), session.is_some())
}

/// Login page URL carrying the originally requested location as `callbackUrl`.
pub fn login_redirect_target(path_and_query: &str) -> String {
    format!(
        "{LOGIN_PATH}?callbackUrl={}",
        urlencoding::encode(path_and_query)
    )
}
