use crate::{
    AppState,
    content::Content,
    handlers,
    models::{
        Achievement, Bio, CarouselSlide, ContactInfo, Education, Experience, Project, Service,
        Skill,
    },
};
use axum::{
    Router,
    routing::{get, post},
};

/// kind_routes
///
/// The CRUD surface for one content kind, mounted at `/api/{segment}`:
///
/// - `GET    /api/{segment}`          list (active only unless signed in)
/// - `POST   /api/{segment}`          create
/// - `POST   /api/{segment}/reorder`  bulk display-order update
/// - `GET    /api/{segment}/{id}`     read
/// - `PUT    /api/{segment}/{id}`     partial update
/// - `DELETE /api/{segment}/{id}`     delete
///
/// and the HTML form variants the admin screens post to:
///
/// - `POST   /api/{segment}/form`         create
/// - `POST   /api/{segment}/{id}/form`    update
/// - `POST   /api/{segment}/{id}/delete`  delete
pub fn kind_routes<K: Content>() -> Router<AppState> {
    let base = format!("/api/{}", K::KIND.segment());
    Router::new()
        .route(
            &base,
            get(handlers::list_content::<K>).post(handlers::create_content::<K>),
        )
        .route(
            &format!("{base}/reorder"),
            post(handlers::reorder_content::<K>),
        )
        .route(
            &format!("{base}/form"),
            post(handlers::create_content_form::<K>),
        )
        .route(
            &format!("{base}/{{id}}"),
            get(handlers::get_content::<K>)
                .put(handlers::update_content::<K>)
                .delete(handlers::delete_content::<K>),
        )
        .route(
            &format!("{base}/{{id}}/form"),
            post(handlers::update_content_form::<K>),
        )
        .route(
            &format!("{base}/{{id}}/delete"),
            post(handlers::delete_content_form::<K>),
        )
}

/// Content Router Module
///
/// Every admin-managed content kind gets the identical surface.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .merge(kind_routes::<Bio>())
        .merge(kind_routes::<Experience>())
        .merge(kind_routes::<Education>())
        .merge(kind_routes::<Achievement>())
        .merge(kind_routes::<Skill>())
        .merge(kind_routes::<Service>())
        .merge(kind_routes::<Project>())
        .merge(kind_routes::<CarouselSlide>())
        .merge(kind_routes::<ContactInfo>())
}
