use axum::http::Method;
use chrono::{Duration, Utc};
use folio_server::{
    policy::{
        Decision, LOGIN_PATH, RouteClass, classify, decide, evaluate, login_redirect_target,
    },
    redirect::{
        RedirectContext, absolute_target, application_base, callback_or, is_wildcard_host,
        resolve_origin, sanitize_callback,
    },
    session::Session,
};
use reqwest::Url;
use uuid::Uuid;

// --- Helpers ---

fn admin_session() -> Session {
    Session {
        user_id: Uuid::new_v4(),
        email: "owner@myportfolio.example".to_string(),
        role: "admin".to_string(),
        token_id: Uuid::new_v4(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

fn ctx<'a>(
    host: Option<&'a str>,
    referer: Option<&'a str>,
    canonical: Option<&'a Url>,
) -> RedirectContext<'a> {
    RedirectContext {
        host,
        referer,
        scheme: "http",
        canonical,
    }
}

// --- Classification & Decision Table ---

#[test]
fn test_admin_pages_require_session() {
    let session = admin_session();
    assert_eq!(
        evaluate("/admin/projects", &Method::GET, None),
        Decision::RedirectToLogin
    );
    assert_eq!(
        evaluate("/admin/projects", &Method::GET, Some(&session)),
        Decision::Allow
    );
    assert_eq!(evaluate("/admin", &Method::GET, None), Decision::RedirectToLogin);
    // Not under /admin.
    assert_eq!(evaluate("/administrator", &Method::GET, None), Decision::Allow);
}

#[test]
fn test_login_page_sends_signed_in_admin_away() {
    let session = admin_session();
    assert_eq!(evaluate(LOGIN_PATH, &Method::GET, None), Decision::Allow);
    assert_eq!(
        evaluate(LOGIN_PATH, &Method::GET, Some(&session)),
        Decision::RedirectAwayFromLogin
    );
    // Trailing and repeated slashes do not dodge the rule.
    assert_eq!(
        evaluate("//admin//login/", &Method::GET, Some(&session)),
        Decision::RedirectAwayFromLogin
    );
}

#[test]
fn test_mutating_api_requires_session() {
    let session = admin_session();
    for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
        assert_eq!(
            evaluate("/api/projects", &method, None),
            Decision::Unauthorized,
            "{method} without session"
        );
        assert_eq!(
            evaluate("/api/projects", &method, Some(&session)),
            Decision::Allow,
            "{method} with session"
        );
    }
}

#[test]
fn test_public_allow_list_is_exact() {
    assert_eq!(evaluate("/api/enquiries", &Method::POST, None), Decision::Allow);
    assert_eq!(evaluate("/api/contact", &Method::POST, None), Decision::Allow);
    assert_eq!(evaluate("/api/enquiries/", &Method::POST, None), Decision::Allow);
    // Other methods and sub-paths are not allow-listed.
    assert_eq!(
        evaluate("/api/enquiries", &Method::DELETE, None),
        Decision::Unauthorized
    );
    assert_eq!(
        evaluate("/api/enquiries/bulk-delete", &Method::POST, None),
        Decision::Unauthorized
    );
}

#[test]
fn test_read_api_and_auth_routes_always_allowed() {
    for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
        assert_eq!(evaluate("/api/projects", &method, None), Decision::Allow);
    }
    assert_eq!(evaluate("/api/auth/login", &Method::POST, None), Decision::Allow);
    assert_eq!(evaluate("/api/auth/logout", &Method::POST, None), Decision::Allow);
    assert_eq!(classify("/api/authors", &Method::POST), RouteClass::ProtectedWriteApi);
}

#[test]
fn test_unknown_methods_fail_closed() {
    let purge = Method::from_bytes(b"PURGE").unwrap();
    assert_eq!(evaluate("/api/projects", &purge, None), Decision::Unauthorized);
}

#[test]
fn test_dot_segments_cannot_escape_auth_prefix() {
    assert_eq!(
        classify("/api/auth/../projects", &Method::POST),
        RouteClass::ProtectedWriteApi
    );
    assert_eq!(classify("/api/./auth/login", &Method::POST), RouteClass::AuthInfrastructure);
}

#[test]
fn test_public_pages_allowed() {
    for path in ["/", "/about", "/projects", "/contact", "/health"] {
        assert_eq!(classify(path, &Method::GET), RouteClass::PublicPage);
        assert_eq!(evaluate(path, &Method::GET, None), Decision::Allow);
    }
}

#[test]
fn test_decision_is_idempotent() {
    let session = admin_session();
    let cases = [
        ("/admin/projects", Method::GET),
        ("/admin/login", Method::GET),
        ("/api/projects", Method::POST),
        ("/api/enquiries", Method::POST),
        ("/api/projects", Method::GET),
    ];
    for (path, method) in cases {
        for s in [None, Some(&session)] {
            let first = evaluate(path, &method, s);
            let second = evaluate(path, &method, s);
            assert_eq!(first, second);
            assert_eq!(decide(classify(path, &method), s.is_some()), first);
        }
    }
}

#[test]
fn test_login_redirect_target_carries_callback() {
    assert_eq!(
        login_redirect_target("/admin/projects?page=2"),
        "/admin/login?callbackUrl=%2Fadmin%2Fprojects%3Fpage%3D2"
    );
}

// --- Host Normalization ---

#[test]
fn test_wildcard_host_recovered_from_referer() {
    let context = ctx(
        Some("0.0.0.0:3000"),
        Some("https://myportfolio.example/admin"),
        None,
    );
    assert_eq!(
        absolute_target(&context, "/admin"),
        "https://myportfolio.example/admin"
    );
}

#[test]
fn test_wildcard_host_uses_canonical_without_referer() {
    let canonical = url("https://myportfolio.example");
    let context = ctx(Some("0.0.0.0:3000"), None, Some(&canonical));
    assert_eq!(resolve_origin(&context).as_str(), "https://myportfolio.example/");
}

#[test]
fn test_foreign_referer_ignored_when_canonical_configured() {
    let canonical = url("https://myportfolio.example");
    let context = ctx(
        Some("[::]:3000"),
        Some("https://evil.example/phish"),
        Some(&canonical),
    );
    assert_eq!(
        absolute_target(&context, "/admin"),
        "https://myportfolio.example/admin"
    );
}

#[test]
fn test_wildcard_referer_is_not_trusted() {
    let context = ctx(Some("0.0.0.0:3000"), Some("http://0.0.0.0:3000/admin"), None);
    let origin = resolve_origin(&context);
    assert_eq!(origin.host_str(), Some("localhost"));
    assert_eq!(origin.port(), Some(3000));
}

#[test]
fn test_concrete_host_used_without_canonical() {
    let context = ctx(Some("localhost:3000"), None, None);
    assert_eq!(resolve_origin(&context).as_str(), "http://localhost:3000/");
    assert_eq!(application_base(&context).as_str(), "http://localhost:3000/");
}

#[test]
fn test_canonical_origin_wins_over_concrete_host() {
    let canonical = url("https://myportfolio.example");
    for host in ["myportfolio.example", "evil.example", "localhost:3000"] {
        let context = ctx(Some(host), None, Some(&canonical));
        assert_eq!(
            absolute_target(&context, "/admin"),
            "https://myportfolio.example/admin",
            "host {host}"
        );
        assert_eq!(application_base(&context).as_str(), "https://myportfolio.example/");
    }

    // A forwarded https scheme on the canonical host lands on the same place.
    let context = RedirectContext {
        scheme: "https",
        ..ctx(Some("myportfolio.example"), None, Some(&canonical))
    };
    assert_eq!(resolve_origin(&context).as_str(), "https://myportfolio.example/");
}

#[test]
fn test_malformed_referer_falls_back_to_canonical() {
    let canonical = url("https://myportfolio.example");
    for referer in ["not a url", "http://", "://missing-scheme/admin", "ftp://files.example/x"] {
        let context = ctx(Some("0.0.0.0:3000"), Some(referer), Some(&canonical));
        assert_eq!(
            absolute_target(&context, "/admin"),
            "https://myportfolio.example/admin",
            "referer {referer}"
        );
    }
}

#[test]
fn test_malformed_referer_without_canonical_uses_localhost() {
    let context = ctx(Some("0.0.0.0:3000"), Some("not a url"), None);
    assert_eq!(absolute_target(&context, "/admin"), "http://localhost:3000/admin");
}

#[test]
fn test_resolved_origin_never_wildcard() {
    let hosts = [Some("0.0.0.0"), Some("0.0.0.0:3000"), Some("[::]:8080"), None];
    for host in hosts {
        let origin = resolve_origin(&ctx(host, None, None));
        let host_str = origin.host_str().unwrap_or("");
        assert!(!is_wildcard_host(host_str), "wildcard leaked for {host:?}");
    }
}

// --- Callback Sanitization ---

#[test]
fn test_relative_callback_unchanged() {
    let base = url("https://myportfolio.example/");
    assert_eq!(sanitize_callback("/admin/projects?x=1", &base), "/admin/projects?x=1");
}

#[test]
fn test_foreign_callback_becomes_base() {
    let base = url("https://myportfolio.example/");
    for raw in [
        "https://evil.example/admin",
        "//evil.example/admin",
        "/\\evil.example",
        "javascript:alert(1)",
        "not a url",
    ] {
        assert_eq!(sanitize_callback(raw, &base), base.as_str(), "input {raw}");
    }
}

#[test]
fn test_same_origin_callback_accepted() {
    let base = url("https://myportfolio.example/");
    assert_eq!(
        sanitize_callback("https://myportfolio.example/admin/skills", &base),
        "https://myportfolio.example/admin/skills"
    );
}

#[test]
fn test_wildcard_callback_rewritten_onto_base() {
    let base = url("https://myportfolio.example/");
    assert_eq!(
        sanitize_callback("http://0.0.0.0:3000/admin/projects?tab=2#top", &base),
        "https://myportfolio.example/admin/projects?tab=2#top"
    );
}

#[test]
fn test_missing_callback_uses_default() {
    let base = url("https://myportfolio.example/");
    assert_eq!(callback_or(None, "/admin", &base), "/admin");
    assert_eq!(callback_or(Some("  "), "/admin", &base), "/admin");
    assert_eq!(callback_or(Some("/admin/bio"), "/admin", &base), "/admin/bio");
}
