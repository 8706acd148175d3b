use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use folio_server::{
    AppConfig, AppState, create_router,
    auth::ensure_admin,
    config::parse_base_url,
    repository::{InMemoryRepository, RepositoryState},
    session::{JwtSessionStore, SessionState},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "owner@myportfolio.example";
const ADMIN_PASSWORD: &str = "correct horse battery";

// --- Helpers ---

async fn test_app() -> Router {
    let repo: RepositoryState = Arc::new(InMemoryRepository::new());
    ensure_admin(&repo, ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    create_router(AppState {
        repo,
        sessions: Arc::new(JwtSessionStore::new("router-test-secret", 3600)) as SessionState,
        config: AppConfig::default(),
    })
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn form_post(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Signs in through the browser form and returns the `name=value` cookie pair.
async fn sign_in(app: &Router) -> String {
    let response = send(
        app,
        form_post(
            "/api/auth/login",
            &[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("login should set the session cookie")
        .to_string()
}

// --- Tests ---

#[tokio::test]
async fn test_health_and_request_id() {
    let app = test_app().await;
    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_admin_page_redirects_to_login() {
    let app = test_app().await;
    let response = send(&app, get("/admin/projects?tab=2", None)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "/admin/login?callbackUrl=%2Fadmin%2Fprojects%3Ftab%3D2"
    );
}

#[tokio::test]
async fn test_login_page_renders_for_anonymous() {
    let app = test_app().await;
    let response = send(&app, get("/admin/login?callbackUrl=%2Fadmin%2Fskills&error=CredentialsSignin", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("action=\"/api/auth/login\""));
    assert!(html.contains("value=\"/admin/skills\""));
    assert!(html.contains("Invalid email or password"));
}

#[tokio::test]
async fn test_mutating_api_without_session_is_401() {
    let app = test_app().await;
    let response = send(
        &app,
        json_request("POST", "/api/projects", json!({"title": "x"}), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn test_public_enquiry_submission_allowed() {
    let app = test_app().await;
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/enquiries",
            json!({"name": "Ada", "email": "ada@visitor.example", "message": "Hi"}),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["status"], "new");

    // The inbox itself is admin-only.
    let response = send(&app, get("/api/enquiries", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_contact_form_redirects_back() {
    let app = test_app().await;
    let ok = send(
        &app,
        form_post(
            "/api/contact",
            &[
                ("name", "Ada"),
                ("email", "ada@visitor.example"),
                ("subject", ""),
                ("message", "Hello"),
            ],
        ),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&ok), "/contact?sent=1");

    let bad = send(
        &app,
        form_post(
            "/api/contact",
            &[("name", "Ada"), ("email", "nope"), ("message", "Hello")],
        ),
    )
    .await;
    assert_eq!(bad.status(), StatusCode::SEE_OTHER);
    assert!(location(&bad).starts_with("/contact?error="));
}

#[tokio::test]
async fn test_login_flow_and_protected_writes() {
    let app = test_app().await;
    let cookie = sign_in(&app).await;
    assert!(cookie.starts_with("folio_session="));

    let response = send(&app, get("/admin/projects", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        json_request("POST", "/api/projects", json!({"title": "Folio"}), Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/projects/{id}"),
            json!({"is_active": false}),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Inactive: hidden from anonymous readers, visible to the admin.
    let response = send(&app, get(&format!("/api/projects/{id}"), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&app, get(&format!("/api/projects/{id}"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_redirects_to_sanitized_callback() {
    let app = test_app().await;

    let response = send(
        &app,
        form_post(
            "/api/auth/login",
            &[
                ("email", ADMIN_EMAIL),
                ("password", ADMIN_PASSWORD),
                ("callbackUrl", "/admin/skills"),
            ],
        ),
    )
    .await;
    assert_eq!(location(&response), "/admin/skills");

    let mut request = form_post(
        "/api/auth/login",
        &[
            ("email", ADMIN_EMAIL),
            ("password", ADMIN_PASSWORD),
            ("callbackUrl", "https://evil.example/steal"),
        ],
    );
    request
        .headers_mut()
        .insert(header::HOST, "localhost:3000".parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(location(&response), "http://localhost:3000/");
}

#[tokio::test]
async fn test_failed_login_returns_to_form() {
    let app = test_app().await;
    let response = send(
        &app,
        form_post(
            "/api/auth/login",
            &[("email", ADMIN_EMAIL), ("password", "wrong")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/admin/login?error=CredentialsSignin&callbackUrl=%2Fadmin"
    );
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_page_with_session_redirects_to_recovered_origin() {
    let app = test_app().await;
    let cookie = sign_in(&app).await;

    let request = Request::builder()
        .uri("/admin/login")
        .header(header::HOST, "0.0.0.0:3000")
        .header(header::REFERER, "https://myportfolio.example/admin")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "https://myportfolio.example/admin");
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let app = test_app().await;
    let cookie = sign_in(&app).await;

    let mut request = form_post("/api/auth/logout", &[]);
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/login");
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cleared.contains("Max-Age=0"));

    // The old token no longer opens the admin area.
    let response = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_token_endpoint_and_bearer_access() {
    let app = test_app().await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/token",
            json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/auth/session")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let session = body_json(send(&app, request).await).await;
    assert_eq!(session["user"]["email"], ADMIN_EMAIL);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/token",
            json!({"email": ADMIN_EMAIL, "password": "nope"}),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_session_is_null() {
    let app = test_app().await;
    let body = body_json(send(&app, get("/api/auth/session", None)).await).await;
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn test_public_pages_render() {
    let app = test_app().await;
    for path in ["/", "/about", "/projects", "/contact"] {
        let response = send(&app, get(path, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(body_text(response).await.starts_with("<!doctype html>"));
    }
    let response = send(&app, get("/no-such-page", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

#[tokio::test]
async fn test_admin_forms_create_edit_and_delete_content() {
    let app = test_app().await;
    let cookie = sign_in(&app).await;

    let response = send(&app, get("/admin/projects/new", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("action=\"/api/projects/form\""));

    let response = send(
        &app,
        with_cookie(
            form_post(
                "/api/projects/form",
                &[
                    ("title", "Folio"),
                    ("summary", "Portfolio engine"),
                    ("tech_stack", "Rust\nAxum"),
                    ("is_active", "on"),
                ],
            ),
            &cookie,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/projects?saved=1");

    let listed = body_json(send(&app, get("/api/projects", Some(&cookie))).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["tech_stack"], json!(["Rust", "Axum"]));
    let id = listed[0]["id"].as_str().unwrap().to_string();

    let response = send(&app, get("/admin/projects", Some(&cookie))).await;
    let html = body_text(response).await;
    assert!(html.contains(&format!("href=\"/admin/projects/{id}\"")));
    assert!(html.contains(&format!("action=\"/api/projects/{id}/delete\"")));

    let response = send(&app, get(&format!("/admin/projects/{id}"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("value=\"Folio\""));

    // Invalid input goes back to the edit form with the message.
    let response = send(
        &app,
        with_cookie(
            form_post(&format!("/api/projects/{id}/form"), &[("title", "")]),
            &cookie,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with(&format!("/admin/projects/{id}?error=")));

    // Unticking "Active" hides the project from visitors.
    let response = send(
        &app,
        with_cookie(
            form_post(&format!("/api/projects/{id}/form"), &[("title", "Folio 2")]),
            &cookie,
        ),
    )
    .await;
    assert_eq!(location(&response), "/admin/projects?saved=1");
    let response = send(&app, get(&format!("/api/projects/{id}"), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let updated = body_json(send(&app, get(&format!("/api/projects/{id}"), Some(&cookie))).await).await;
    assert_eq!(updated["title"], "Folio 2");
    assert_eq!(updated["is_active"], false);

    let response = send(
        &app,
        with_cookie(form_post(&format!("/api/projects/{id}/delete"), &[]), &cookie),
    )
    .await;
    assert_eq!(location(&response), "/admin/projects?deleted=1");
    let response = send(&app, get(&format!("/api/projects/{id}"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_forms_require_session() {
    let app = test_app().await;
    let response = send(&app, form_post("/api/skills/form", &[("name", "Rust")])).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, get("/admin/skills/new", None)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let cookie = sign_in(&app).await;
    for path in ["/admin/no-such-kind/new", "/admin/skills/not-a-uuid", "/admin/enquiries/new"] {
        let response = send(&app, get(path, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn test_enquiry_inbox_status_buttons() {
    let app = test_app().await;
    let receipt = body_json(
        send(
            &app,
            json_request(
                "POST",
                "/api/enquiries",
                json!({"name": "Ada", "email": "ada@visitor.example", "message": "Hi"}),
                None,
            ),
        )
        .await,
    )
    .await;
    let id = receipt["id"].as_str().unwrap().to_string();
    let cookie = sign_in(&app).await;

    let html = body_text(send(&app, get("/admin/enquiries", Some(&cookie))).await).await;
    assert!(html.contains(&format!("action=\"/api/enquiries/{id}/status\"")));
    assert!(html.contains("Mark read"));

    let response = send(
        &app,
        with_cookie(
            form_post(&format!("/api/enquiries/{id}/status"), &[("status", "read")]),
            &cookie,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/enquiries");
    let stored = body_json(send(&app, get(&format!("/api/enquiries/{id}"), Some(&cookie))).await).await;
    assert_eq!(stored["status"], "read");

    // Read cannot go back to new: the inbox shows why.
    let response = send(
        &app,
        with_cookie(
            form_post(&format!("/api/enquiries/{id}/status"), &[("status", "new")]),
            &cookie,
        ),
    )
    .await;
    assert!(location(&response).starts_with("/admin/enquiries?error="));

    let response = send(
        &app,
        with_cookie(form_post(&format!("/api/enquiries/{id}/delete"), &[]), &cookie),
    )
    .await;
    assert_eq!(location(&response), "/admin/enquiries?deleted=1");
    let response = send(&app, get(&format!("/api/enquiries/{id}"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_page_redirect_stays_on_canonical_origin() {
    let repo: RepositoryState = Arc::new(InMemoryRepository::new());
    ensure_admin(&repo, ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    let app = create_router(AppState {
        repo,
        sessions: Arc::new(JwtSessionStore::new("router-test-secret", 3600)) as SessionState,
        config: AppConfig {
            public_base_url: parse_base_url("https://myportfolio.example"),
            ..AppConfig::default()
        },
    });
    let cookie = sign_in(&app).await;

    for host in ["myportfolio.example", "evil.example"] {
        let request = Request::builder()
            .uri("/admin/login")
            .header(header::HOST, host)
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "https://myportfolio.example/admin", "host {host}");
    }
}
