use crate::{AppState, handlers, pages};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints any client may call. Reads are always allowed by the access
/// gate; the two enquiry submission routes are the only public writes, and
/// `/api/auth/*` is never gated.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- HTML pages ---
        .route("/", get(pages::home_page))
        .route("/about", get(pages::about_page))
        .route("/projects", get(pages::projects_page))
        .route("/contact", get(pages::contact_page))
        // --- Site view models (same data as the pages, as JSON) ---
        .route("/api/site/home", get(handlers::site_home))
        .route("/api/site/about", get(handlers::site_about))
        .route("/api/site/projects", get(handlers::site_projects))
        // --- Contact form ---
        // POST /api/contact accepts both JSON and the HTML form.
        .route("/api/contact", post(handlers::submit_contact))
        // --- Session lifecycle ---
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/token", post(handlers::issue_token))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/session", get(handlers::current_session))
}
