use crate::{AppState, handlers, pages};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Admin Router Module
///
/// The admin UI under `/admin` and the admin-only JSON endpoints.
///
/// Access Control:
/// The access gate redirects anonymous browsers away from `/admin/**` (except
/// the login page) and answers anonymous API writes with 401. Reads of the
/// enquiry inbox and stats are not writes, so those handlers take an
/// `AdminSession` themselves.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Admin UI ---
        .route("/admin", get(pages::dashboard_page))
        .route("/admin/login", get(pages::login_page))
        .route("/admin/enquiries", get(pages::enquiries_page))
        .route("/admin/{segment}", get(pages::content_table_page))
        .route("/admin/{segment}/{target}", get(pages::content_form_page))
        // --- Enquiry inbox ---
        // POST /api/enquiries is the public submission endpoint (allow-listed).
        .route(
            "/api/enquiries",
            get(handlers::list_enquiries).post(handlers::submit_enquiry),
        )
        .route(
            "/api/enquiries/bulk-delete",
            post(handlers::bulk_delete_enquiries),
        )
        .route(
            "/api/enquiries/{id}",
            get(handlers::get_enquiry).delete(handlers::delete_enquiry),
        )
        .route(
            "/api/enquiries/{id}/status",
            patch(handlers::update_enquiry_status).post(handlers::set_enquiry_status_form),
        )
        .route(
            "/api/enquiries/{id}/delete",
            post(handlers::delete_enquiry_form),
        )
        // GET /api/stats
        .route("/api/stats", get(handlers::get_stats))
}
