use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod content;
pub mod enquiries;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod policy;
pub mod redirect;
pub mod repository;
pub mod session;
pub mod views;

// Module for routing segregation (Public, Content, Admin).
pub mod routes;
use policy::{ADMIN_HOME, Decision};
use redirect::{RedirectContext, absolute_target};
use routes::{admin, content as content_routes, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use session::{JwtSessionStore, SessionState};

/// ApiDoc
///
/// Aggregates every documented handler and schema into the OpenAPI document
/// served at `/api-docs/openapi.json`. The per-kind content routes are
/// generic and share one shape; their record schemas are listed here.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::submit_enquiry, handlers::submit_contact, handlers::list_enquiries,
        handlers::get_enquiry, handlers::update_enquiry_status, handlers::set_enquiry_status_form,
        handlers::delete_enquiry,
        handlers::bulk_delete_enquiries, handlers::site_home, handlers::site_about,
        handlers::site_projects, handlers::get_stats, handlers::login, handlers::issue_token,
        handlers::logout, handlers::current_session
    ),
    components(
        schemas(
            models::Bio, models::Experience, models::Education, models::Achievement,
            models::Skill, models::Service, models::Project, models::CarouselSlide,
            models::ContactInfo, models::ReorderEntry, models::Enquiry, models::EnquiryStatus,
            models::CreateEnquiryRequest, models::EnquiryReceipt,
            models::UpdateEnquiryStatusRequest, models::BulkDeleteRequest,
            models::BulkDeleteResponse, models::KindCount, models::DashboardStats,
            models::SessionUser, models::SessionResponse, models::LoginForm,
            models::TokenRequest, models::TokenResponse, models::LogoutForm,
            views::HomeView, views::AboutView, views::SkillGroup, views::ProjectsView,
        )
    ),
    tags(
        (name = "folio-server", description = "Portfolio site and admin API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container shared by every request: the record store,
/// the session store and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    /// Record store for content, enquiries and the admin account.
    pub repo: RepositoryState,
    /// Issues and validates admin session tokens.
    pub sessions: SessionState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// access_gate
///
/// Runs the access policy for every request before routing. The session (if
/// any) is resolved once here and handed to `policy::evaluate`; on `Allow` it
/// is stored in the request extensions for the handler extractors.
///
/// - `RedirectToLogin`: 307 to `/admin/login?callbackUrl=<original path>`.
/// - `RedirectAwayFromLogin`: 307 to the admin home on the resolved origin
///   (never a wildcard bind address).
/// - `Unauthorized`: 401 JSON.
async fn access_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let session = match session::session_token(request.headers()) {
        Some(token) => state.sessions.validate(&token).await,
        None => None,
    };

    let path = request.uri().path().to_string();
    match policy::evaluate(&path, request.method(), session.as_ref()) {
        Decision::Allow => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        Decision::RedirectToLogin => {
            tracing::debug!(%path, "admin page without session; redirecting to login");
            let original = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(&path);
            Redirect::temporary(&policy::login_redirect_target(original)).into_response()
        }
        Decision::RedirectAwayFromLogin => {
            let ctx = RedirectContext::from_headers(request.headers(), &state.config);
            let target = absolute_target(&ctx, ADMIN_HOME);
            tracing::debug!(%target, "login page with live session; redirecting to admin home");
            Redirect::temporary(&target).into_response()
        }
        Decision::Unauthorized => {
            tracing::debug!(%path, method = %request.method(), "mutating API call without session");
            error::json_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "sign in to perform this action",
            )
        }
    }
}

/// create_router
///
/// Assembles the routing table, puts the access gate in front of all of it
/// (including the fallback) and adds the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(content_routes::content_routes())
        .merge(admin::admin_routes())
        .fallback(pages::not_found_page)
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying method, URI and the generated `x-request-id`, so all
/// log lines of one request correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
