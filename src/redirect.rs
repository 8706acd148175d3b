//! Redirect targets.
//!
//! Origin recovery for redirects when the server is reached through a
//! wildcard bind address, and sanitization of client-supplied callback URLs.
//! Nothing here returns an error: malformed input always degrades to the
//! safe default.

use axum::http::{HeaderMap, header};
use reqwest::Url;
use std::net::IpAddr;

use crate::config::AppConfig;

/// Host substituted for a wildcard bind address when no trusted origin exists.
pub const LOOPBACK_HOST: &str = "localhost";

/// RedirectContext
///
/// The request signals consulted when building an absolute redirect target.
#[derive(Debug, Clone)]
pub struct RedirectContext<'a> {
    pub host: Option<&'a str>,
    pub referer: Option<&'a str>,
    pub scheme: &'a str,
    pub canonical: Option<&'a Url>,
}

impl<'a> RedirectContext<'a> {
    pub fn from_headers(headers: &'a HeaderMap, config: &'a AppConfig) -> Self {
        let scheme = match headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
        {
            Some("https") => "https",
            _ => "http",
        };
        Self {
            host: header_text(headers, header::HOST),
            referer: header_text(headers, header::REFERER),
            scheme,
            canonical: config.public_base_url.as_ref(),
        }
    }
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_ip(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .ok()
}

/// is_wildcard_host
///
/// True for an all-interfaces address (`0.0.0.0`, `::`, `[::]`), with or
/// without a port.
pub fn is_wildcard_host(host: &str) -> bool {
    let host = host.trim();
    // A bare IPv6 literal has colons but no brackets, so it cannot carry a port.
    if let Some(ip) = parse_ip(host) {
        return ip.is_unspecified();
    }
    Url::parse(&format!("http://{host}/"))
        .ok()
        .and_then(|url| url.host_str().and_then(parse_ip))
        .is_some_and(|ip| ip.is_unspecified())
}

fn url_has_wildcard_host(url: &Url) -> bool {
    url.host_str()
        .and_then(parse_ip)
        .is_some_and(|ip| ip.is_unspecified())
}

fn origin_url(url: &Url) -> Option<Url> {
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Url::parse(&url.origin().ascii_serialization()).ok()
}

/// The request's own base URL as reported by its Host header.
fn request_base(scheme: &str, host: &str) -> Option<Url> {
    Url::parse(&format!("{scheme}://{}/", host.trim()))
        .ok()
        .and_then(|url| origin_url(&url))
}

/// resolve_origin
///
/// Origin to use for an absolute redirect. When a canonical base URL is
/// configured it is always the answer: request headers never move a redirect
/// off the canonical origin. Without one, a non-wildcard Host is used as is;
/// for a wildcard (or missing) Host the origin is recovered from the Referer
/// (only if it is http(s) and not itself a wildcard), and finally from the
/// request's own base URL with the wildcard swapped for `localhost`. The
/// result never carries a wildcard host.
pub fn resolve_origin(ctx: &RedirectContext<'_>) -> Url {
    if let Some(canonical) = ctx.canonical {
        return canonical.clone();
    }

    if let Some(host) = ctx.host.filter(|h| !h.trim().is_empty() && !is_wildcard_host(h)) {
        if let Some(base) = request_base(ctx.scheme, host) {
            return base;
        }
    }

    let from_referer = ctx
        .referer
        .and_then(|raw| Url::parse(raw).ok())
        .and_then(|url| origin_url(&url))
        .filter(|origin| !url_has_wildcard_host(origin));
    if let Some(origin) = from_referer {
        return origin;
    }

    tracing::warn!(
        host = ctx.host.unwrap_or(""),
        "no trusted origin for redirect; falling back to {}",
        LOOPBACK_HOST
    );
    let mut fallback = ctx
        .host
        .and_then(|host| request_base(ctx.scheme, host))
        .unwrap_or_else(loopback_base);
    if url_has_wildcard_host(&fallback) && fallback.set_host(Some(LOOPBACK_HOST)).is_err() {
        fallback = loopback_base();
    }
    fallback
}

fn loopback_base() -> Url {
    Url::parse("http://localhost/").expect("static loopback URL is valid")
}

/// application_base
///
/// The application's own base URL, used to judge callback URLs.
pub fn application_base(ctx: &RedirectContext<'_>) -> Url {
    resolve_origin(ctx)
}

/// absolute_target
///
/// `path` resolved against the redirect origin for this request.
pub fn absolute_target(ctx: &RedirectContext<'_>, path: &str) -> String {
    let origin = resolve_origin(ctx);
    origin
        .join(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| path.to_string())
}

/// A root-relative path that a browser cannot reinterpret as another origin.
fn is_safe_relative(raw: &str) -> bool {
    raw.starts_with('/')
        && !raw.starts_with("//")
        && !raw.starts_with("/\\")
        && !raw.contains('\\')
}

/// sanitize_callback
///
/// Makes a client-supplied callback URL safe to redirect to:
/// - a root-relative path is returned unchanged;
/// - an absolute URL on the application's origin is accepted;
/// - an absolute URL on a wildcard host is moved onto the application base,
///   keeping its path, query and fragment;
/// - anything else (foreign origin, other schemes, protocol-relative,
///   malformed) becomes the application base URL.
pub fn sanitize_callback(raw: &str, app_base: &Url) -> String {
    let raw = raw.trim();
    // Browsers strip tabs and newlines, which can turn "/\t/x" into "//x".
    if raw.is_empty() || raw.chars().any(|c| c.is_control()) {
        return app_base.to_string();
    }
    if is_safe_relative(raw) {
        return raw.to_string();
    }

    let Ok(url) = Url::parse(raw) else {
        return app_base.to_string();
    };
    if !matches!(url.scheme(), "http" | "https") {
        return app_base.to_string();
    }
    if url.origin() == app_base.origin() {
        return url.to_string();
    }
    if url_has_wildcard_host(&url) {
        let mut rewritten = app_base.clone();
        rewritten.set_path(url.path());
        rewritten.set_query(url.query());
        rewritten.set_fragment(url.fragment());
        return rewritten.to_string();
    }
    app_base.to_string()
}

/// Callback target for a request, or `default` when none was supplied.
pub fn callback_or(raw: Option<&str>, default: &str, app_base: &Url) -> String {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => sanitize_callback(raw, app_base),
        None => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_hosts_are_detected() {
        assert!(is_wildcard_host("0.0.0.0"));
        assert!(is_wildcard_host("0.0.0.0:3000"));
        assert!(is_wildcard_host("[::]:3000"));
        assert!(is_wildcard_host("::"));
        assert!(!is_wildcard_host("localhost:3000"));
        assert!(!is_wildcard_host("127.0.0.1"));
        assert!(!is_wildcard_host("myportfolio.example"));
    }

    #[test]
    fn loopback_fallback_is_localhost() {
        assert_eq!(loopback_base().as_str(), "http://localhost/");
    }

    #[test]
    fn control_characters_fall_back_to_base() {
        let base = Url::parse("https://myportfolio.example/").unwrap();
        assert_eq!(sanitize_callback("/\t/evil.example", &base), base.as_str());
    }
}
