use crate::{
    AppState,
    auth::{self, AdminSession, MaybeSession},
    config::Env,
    content::{self, Content},
    enquiries,
    error::AppError,
    forms,
    models::{
        BulkDeleteRequest, BulkDeleteResponse, CreateEnquiryRequest, DashboardStats, Enquiry,
        EnquiryReceipt, EnquiryStatus, LoginForm, LogoutForm, RecordKind, ReorderEntry, SessionResponse,
        SessionUser, TokenRequest, TokenResponse, UpdateEnquiryStatusRequest,
    },
    policy::{ADMIN_HOME, LOGIN_PATH},
    redirect::{RedirectContext, application_base, callback_or},
    session::{clear_session_cookie, session_cookie, session_token},
    views::{self, AboutView, HomeView, ProjectsView},
};
use axum::{
    Form, Json,
    extract::{FromRequest, Path, Query, Request, State, rejection::FormRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

// --- Filter Structs ---

/// ContentFilter
///
/// Query parameters for content listings. `active=true` restricts a signed-in
/// admin's listing to active records; anonymous callers only ever see those.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContentFilter {
    pub active: Option<bool>,
}

/// EnquiryFilter
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EnquiryFilter {
    pub status: Option<EnquiryStatus>,
}

// --- Content Handlers (one instance per content kind) ---

/// list_content
///
/// [Public Route] Lists records of kind `K` in display order.
pub async fn list_content<K: Content>(
    MaybeSession(session): MaybeSession,
    State(state): State<AppState>,
    Query(filter): Query<ContentFilter>,
) -> Result<Json<Vec<K>>, AppError> {
    let include_inactive = session.is_some() && filter.active != Some(true);
    let records = content::list::<K>(state.repo.as_ref(), include_inactive).await?;
    Ok(Json(records))
}

/// get_content
///
/// [Public Route] One record. Inactive records exist only for admins.
pub async fn get_content<K: Content>(
    MaybeSession(session): MaybeSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<K>, AppError> {
    let record = content::get::<K>(state.repo.as_ref(), id, session.is_some()).await?;
    Ok(Json(record))
}

pub async fn create_content<K: Content>(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<K>), AppError> {
    let record = content::create::<K>(state.repo.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_content<K: Content>(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<K>, AppError> {
    let record = content::update::<K>(state.repo.as_ref(), id, body).await?;
    Ok(Json(record))
}

pub async fn delete_content<K: Content>(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    content::delete::<K>(state.repo.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_content<K: Content>(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Json(entries): Json<Vec<ReorderEntry>>,
) -> Result<Json<Vec<K>>, AppError> {
    let records = content::reorder::<K>(state.repo.as_ref(), entries).await?;
    Ok(Json(records))
}

// --- Admin Form Handlers ---
//
// HTML forms can only GET or POST, so the admin screens post here and get a
// 303 back to the screen they came from.

/// form_redirect
///
/// Turns the outcome of a form submission into a redirect: `done` on success,
/// `retry` with `?error=<message>` appended for input the admin can correct.
/// Anything else (storage failures, missing records) stays an error response.
fn form_redirect(result: Result<(), AppError>, done: &str, retry: &str) -> Result<Response, AppError> {
    match result {
        Ok(()) => Ok(Redirect::to(done).into_response()),
        Err(AppError::Validation(message) | AppError::Conflict(message)) => {
            let separator = if retry.contains('?') { '&' } else { '?' };
            let target = format!("{retry}{separator}error={}", urlencoding::encode(&message));
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => Err(e),
    }
}

fn admin_list_path(kind: RecordKind) -> String {
    format!("{ADMIN_HOME}/{}", kind.segment())
}

/// create_content_form
///
/// [Admin Route] `POST /api/{segment}/form` from the admin "new record" screen.
pub async fn create_content_form<K: Content>(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let list = admin_list_path(K::KIND);
    let result = match forms::document_from_form(K::KIND, &pairs) {
        Ok(doc) => content::create::<K>(state.repo.as_ref(), Value::Object(doc))
            .await
            .map(|_| ()),
        Err(e) => Err(e),
    };
    form_redirect(result, &format!("{list}?saved=1"), &format!("{list}/new"))
}

/// update_content_form
///
/// [Admin Route] `POST /api/{segment}/{id}/form` from the admin edit screen.
/// The form carries every editable field, so it replaces them all.
pub async fn update_content_form<K: Content>(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let list = admin_list_path(K::KIND);
    let result = match forms::document_from_form(K::KIND, &pairs) {
        Ok(doc) => content::update::<K>(state.repo.as_ref(), id, Value::Object(doc))
            .await
            .map(|_| ()),
        Err(e) => Err(e),
    };
    form_redirect(result, &format!("{list}?saved=1"), &format!("{list}/{id}"))
}

/// delete_content_form
///
/// [Admin Route] `POST /api/{segment}/{id}/delete` from the admin table.
pub async fn delete_content_form<K: Content>(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    content::delete::<K>(state.repo.as_ref(), id).await?;
    Ok(Redirect::to(&format!("{}?deleted=1", admin_list_path(K::KIND))).into_response())
}

// --- Enquiry Handlers ---

fn receipt(enquiry: &Enquiry) -> EnquiryReceipt {
    EnquiryReceipt {
        id: enquiry.id,
        status: enquiry.status,
    }
}

/// submit_enquiry
///
/// [Public Route] Stores a contact-form submission. Reachable without a
/// session through the public write allow-list.
#[utoipa::path(
    post,
    path = "/api/enquiries",
    request_body = CreateEnquiryRequest,
    responses(
        (status = 201, description = "Enquiry stored", body = EnquiryReceipt),
        (status = 422, description = "Invalid submission")
    )
)]
pub async fn submit_enquiry(
    State(state): State<AppState>,
    Json(payload): Json<CreateEnquiryRequest>,
) -> Result<(StatusCode, Json<EnquiryReceipt>), AppError> {
    let enquiry = enquiries::submit(state.repo.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(receipt(&enquiry))))
}

fn is_form_post(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// submit_contact
///
/// [Public Route] Same as `submit_enquiry`, but also accepts the HTML contact
/// form. Form posts are answered with a redirect back to `/contact`.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = CreateEnquiryRequest,
    responses(
        (status = 201, description = "Enquiry stored (JSON body)", body = EnquiryReceipt),
        (status = 303, description = "Enquiry handled (form body)"),
        (status = 422, description = "Invalid submission")
    )
)]
pub async fn submit_contact(State(state): State<AppState>, request: Request) -> Result<Response, AppError> {
    if !is_form_post(request.headers()) {
        let Json(payload) = Json::<CreateEnquiryRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        let enquiry = enquiries::submit(state.repo.as_ref(), payload).await?;
        return Ok((StatusCode::CREATED, Json(receipt(&enquiry))).into_response());
    }

    let Form(payload) = Form::<CreateEnquiryRequest>::from_request(request, &state)
        .await
        .map_err(|e| AppError::validation(e.body_text()))?;
    let result = enquiries::submit(state.repo.as_ref(), payload).await.map(|_| ());
    form_redirect(result, "/contact?sent=1", "/contact")
}

/// list_enquiries
///
/// [Admin Route] The enquiry inbox, newest first, optionally by status.
#[utoipa::path(
    get,
    path = "/api/enquiries",
    params(EnquiryFilter),
    responses(
        (status = 200, description = "Enquiries", body = [Enquiry]),
        (status = 401, description = "No session")
    )
)]
pub async fn list_enquiries(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Query(filter): Query<EnquiryFilter>,
) -> Result<Json<Vec<Enquiry>>, AppError> {
    Ok(Json(enquiries::list(state.repo.as_ref(), filter.status).await?))
}

#[utoipa::path(
    get,
    path = "/api/enquiries/{id}",
    params(("id" = Uuid, Path, description = "Enquiry ID")),
    responses(
        (status = 200, description = "Enquiry", body = Enquiry),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_enquiry(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Enquiry>, AppError> {
    Ok(Json(enquiries::get(state.repo.as_ref(), id).await?))
}

/// update_enquiry_status
///
/// [Admin Route] Moves an enquiry through its workflow; disallowed
/// transitions are rejected with 409.
#[utoipa::path(
    patch,
    path = "/api/enquiries/{id}/status",
    params(("id" = Uuid, Path, description = "Enquiry ID")),
    request_body = UpdateEnquiryStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Enquiry),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Transition not allowed")
    )
)]
pub async fn update_enquiry_status(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEnquiryStatusRequest>,
) -> Result<Json<Enquiry>, AppError> {
    let enquiry = enquiries::set_status(state.repo.as_ref(), id, payload.status).await?;
    Ok(Json(enquiry))
}

/// set_enquiry_status_form
///
/// [Admin Route] `POST /api/enquiries/{id}/status` from the status buttons in
/// the admin inbox. A disallowed transition comes back as an error notice.
#[utoipa::path(
    post,
    path = "/api/enquiries/{id}/status",
    params(("id" = Uuid, Path, description = "Enquiry ID")),
    request_body(content = UpdateEnquiryStatusRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Back to the inbox"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn set_enquiry_status_form(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(payload): Form<UpdateEnquiryStatusRequest>,
) -> Result<Response, AppError> {
    let inbox = admin_list_path(RecordKind::Enquiry);
    let result = enquiries::set_status(state.repo.as_ref(), id, payload.status)
        .await
        .map(|_| ());
    form_redirect(result, &inbox, &inbox)
}

/// delete_enquiry_form
///
/// [Admin Route] `POST /api/enquiries/{id}/delete` from the admin inbox.
pub async fn delete_enquiry_form(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    enquiries::delete(state.repo.as_ref(), id).await?;
    let inbox = admin_list_path(RecordKind::Enquiry);
    Ok(Redirect::to(&format!("{inbox}?deleted=1")).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/enquiries/{id}",
    params(("id" = Uuid, Path, description = "Enquiry ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_enquiry(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    enquiries::delete(state.repo.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/enquiries/bulk-delete",
    request_body = BulkDeleteRequest,
    responses((status = 200, description = "Deleted count", body = BulkDeleteResponse))
)]
pub async fn bulk_delete_enquiries(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let deleted = enquiries::bulk_delete(state.repo.as_ref(), &payload.ids).await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}

// --- Site View Handlers ---

#[utoipa::path(
    get,
    path = "/api/site/home",
    responses((status = 200, description = "Home page data", body = HomeView))
)]
pub async fn site_home(State(state): State<AppState>) -> Result<Json<HomeView>, AppError> {
    Ok(Json(views::home(state.repo.as_ref()).await?))
}

#[utoipa::path(
    get,
    path = "/api/site/about",
    responses((status = 200, description = "About page data", body = AboutView))
)]
pub async fn site_about(State(state): State<AppState>) -> Result<Json<AboutView>, AppError> {
    Ok(Json(views::about(state.repo.as_ref()).await?))
}

#[utoipa::path(
    get,
    path = "/api/site/projects",
    responses((status = 200, description = "Active projects", body = ProjectsView))
)]
pub async fn site_projects(State(state): State<AppState>) -> Result<Json<ProjectsView>, AppError> {
    Ok(Json(views::projects(state.repo.as_ref()).await?))
}

/// get_stats
///
/// [Admin Route] Record counts per content kind and enquiry totals.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Dashboard counts", body = DashboardStats),
        (status = 401, description = "No session")
    )
)]
pub async fn get_stats(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(views::dashboard_stats(state.repo.as_ref()).await?))
}

// --- Auth Handlers ---

fn secure_cookies(state: &AppState) -> bool {
    state.config.env == Env::Production
}

/// login
///
/// [Auth Route] Browser sign-in. On success sets the session cookie and
/// redirects to the sanitized callback (default: admin home). On failure
/// redirects back to the login page with `error=CredentialsSignin`, keeping
/// the callback.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to callback or back to the login form"))
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let ctx = RedirectContext::from_headers(&headers, &state.config);
    let app_base = application_base(&ctx);
    let target = callback_or(form.callback_url.as_deref(), ADMIN_HOME, &app_base);

    let Some(user) = auth::authenticate(state.repo.as_ref(), &form.email, &form.password).await? else {
        let retry = format!(
            "{LOGIN_PATH}?error=CredentialsSignin&callbackUrl={}",
            urlencoding::encode(&target)
        );
        return Ok(Redirect::to(&retry).into_response());
    };

    let issued = state.sessions.issue(&user).await?;
    tracing::info!(user_id = %user.id, "admin signed in");
    let cookie = session_cookie(
        &issued.token,
        state.config.session_ttl_secs,
        secure_cookies(&state),
    );
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response())
}

/// issue_token
///
/// [Auth Route] Credential exchange for API clients: returns a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Session issued", body = TokenResponse),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = auth::authenticate(state.repo.as_ref(), &payload.email, &payload.password)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let issued = state.sessions.issue(&user).await?;
    Ok(Json(TokenResponse {
        token: issued.token,
        expires_at: issued.session.expires_at,
    }))
}

/// logout
///
/// [Auth Route] Invalidates the session token, clears the cookie and
/// redirects to the sanitized callback (default: login page).
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 303, description = "Signed out"))
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<LogoutForm>, FormRejection>,
) -> Response {
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let ctx = RedirectContext::from_headers(&headers, &state.config);
    let app_base = application_base(&ctx);
    let token = session_token(&headers);

    let outcome = auth::sign_out(
        state.sessions.as_ref(),
        token.as_deref(),
        form.callback_url.as_deref(),
        &app_base,
    )
    .await;
    tracing::info!(revoked = outcome.revoked, "admin signed out");

    (
        [(header::SET_COOKIE, clear_session_cookie(secure_cookies(&state)))],
        Redirect::to(&outcome.redirect_to),
    )
        .into_response()
}

/// current_session
///
/// [Auth Route] The signed-in admin, or `{"user": null}`.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses((status = 200, description = "Current session", body = SessionResponse))
)]
pub async fn current_session(MaybeSession(session): MaybeSession) -> Json<SessionResponse> {
    let response = match session {
        Some(session) => SessionResponse {
            user: Some(SessionUser {
                id: session.user_id,
                email: session.email,
                role: session.role,
            }),
            expires_at: Some(session.expires_at),
        },
        None => SessionResponse {
            user: None,
            expires_at: None,
        },
    };
    Json(response)
}
