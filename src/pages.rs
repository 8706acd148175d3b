//! Server-rendered HTML.
//!
//! Public site and admin area. Every page shares one shell; all record text is
//! escaped, and forms post to the form-aware API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt::Write;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AdminSession, MaybeSession},
    enquiries,
    error::AppError,
    forms::{self, FieldKind, FormField},
    models::{Enquiry, EnquiryStatus, RecordKind},
    policy::ADMIN_HOME,
    repository::{ListQuery, SortOrder},
    views,
};

// --- Markup helpers ---

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn shell(title: &str, nav: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n<nav>{nav}</nav>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        escape(title)
    ))
}

fn public_nav() -> String {
    [("/", "Home"), ("/about", "About"), ("/projects", "Projects"), ("/contact", "Contact")]
        .iter()
        .map(|(href, label)| format!("<a href=\"{href}\">{label}</a>"))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn admin_nav() -> String {
    let mut nav = format!("<a href=\"{ADMIN_HOME}\">Dashboard</a>");
    for kind in RecordKind::CONTENT.iter().chain([RecordKind::Enquiry].iter()) {
        let _ = write!(
            nav,
            " | <a href=\"/admin/{}\">{}</a>",
            kind.segment(),
            escape(kind.label())
        );
    }
    nav.push_str(
        " <form method=\"post\" action=\"/api/auth/logout\" style=\"display:inline\">\
         <button type=\"submit\">Sign out</button></form>",
    );
    nav
}

fn opt(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_default()
}

// --- Public pages ---

pub async fn home_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let view = views::home(state.repo.as_ref()).await?;
    let mut body = String::new();

    if let Some(bio) = &view.bio {
        let _ = write!(
            body,
            "<header><h1>{}</h1><p>{}</p></header>",
            escape(&bio.name),
            escape(&bio.headline)
        );
    }
    if !view.slides.is_empty() {
        body.push_str("<section class=\"carousel\">");
        for slide in &view.slides {
            let _ = write!(
                body,
                "<figure><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>",
                escape(&slide.image_url),
                escape(&slide.title),
                opt(slide.subtitle.as_deref())
            );
        }
        body.push_str("</section>");
    }
    if !view.services.is_empty() {
        body.push_str("<section><h2>Services</h2><ul>");
        for service in &view.services {
            let _ = write!(
                body,
                "<li><strong>{}</strong> {}</li>",
                escape(&service.title),
                escape(&service.description)
            );
        }
        body.push_str("</ul></section>");
    }
    if !view.featured_projects.is_empty() {
        body.push_str("<section><h2>Featured projects</h2><ul>");
        for project in &view.featured_projects {
            let _ = write!(
                body,
                "<li><strong>{}</strong> {}</li>",
                escape(&project.title),
                escape(&project.summary)
            );
        }
        body.push_str("</ul></section>");
    }
    if let Some(contact) = &view.contact {
        let _ = write!(body, "<footer>{}</footer>", escape(&contact.email));
    }

    let title = view.bio.as_ref().map(|b| b.name.as_str()).unwrap_or("Portfolio");
    Ok(shell(title, &public_nav(), &body))
}

pub async fn about_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let view = views::about(state.repo.as_ref()).await?;
    let mut body = String::from("<h1>About</h1>");

    if let Some(bio) = &view.bio {
        let _ = write!(body, "<p>{}</p>", escape(&bio.summary));
    }
    body.push_str("<h2>Experience</h2><ul>");
    for exp in &view.experiences {
        let until = exp
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "present".to_string());
        let _ = write!(
            body,
            "<li>{} at {} ({} to {})</li>",
            escape(&exp.role),
            escape(&exp.company),
            exp.start_date,
            until
        );
    }
    body.push_str("</ul><h2>Education</h2><ul>");
    for edu in &view.education {
        let _ = write!(
            body,
            "<li>{}, {}</li>",
            escape(&edu.degree),
            escape(&edu.institution)
        );
    }
    body.push_str("</ul><h2>Achievements</h2><ul>");
    for achievement in &view.achievements {
        let _ = write!(body, "<li>{}</li>", escape(&achievement.title));
    }
    body.push_str("</ul><h2>Skills</h2>");
    for group in &view.skill_groups {
        let names: Vec<String> = group.skills.iter().map(|s| escape(&s.name)).collect();
        let _ = write!(
            body,
            "<h3>{}</h3><p>{}</p>",
            escape(&group.category),
            names.join(", ")
        );
    }

    Ok(shell("About", &public_nav(), &body))
}

pub async fn projects_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let view = views::projects(state.repo.as_ref()).await?;
    let mut body = String::from("<h1>Projects</h1>");
    for project in &view.projects {
        let _ = write!(
            body,
            "<article><h2>{}</h2><p>{}</p><p>{}</p></article>",
            escape(&project.title),
            escape(&project.summary),
            escape(&project.tech_stack.join(", "))
        );
    }
    Ok(shell("Projects", &public_nav(), &body))
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactPageQuery {
    pub sent: Option<String>,
    pub error: Option<String>,
}

pub async fn contact_page(Query(query): Query<ContactPageQuery>) -> Html<String> {
    let mut body = String::from("<h1>Contact</h1>");
    if query.sent.is_some() {
        body.push_str("<p class=\"notice\">Thanks, your message has been sent.</p>");
    }
    if let Some(error) = &query.error {
        let _ = write!(body, "<p class=\"error\">{}</p>", escape(error));
    }
    body.push_str(
        "<form method=\"post\" action=\"/api/contact\">\
         <label>Name <input name=\"name\" required maxlength=\"120\"></label>\
         <label>Email <input name=\"email\" type=\"email\" required></label>\
         <label>Subject <input name=\"subject\" maxlength=\"200\"></label>\
         <label>Message <textarea name=\"message\" required maxlength=\"5000\"></textarea></label>\
         <button type=\"submit\">Send</button></form>",
    );
    shell("Contact", &public_nav(), &body)
}

// --- Admin pages ---

#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
    pub error: Option<String>,
}

/// login_page
///
/// The sign-in form. The access gate redirects signed-in admins away before
/// this handler runs.
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Html<String> {
    let mut body = String::from("<h1>Sign in</h1>");
    if query.error.is_some() {
        body.push_str("<p class=\"error\">Invalid email or password.</p>");
    }
    let _ = write!(
        body,
        "<form method=\"post\" action=\"/api/auth/login\">\
         <label>Email <input name=\"email\" type=\"email\" required></label>\
         <label>Password <input name=\"password\" type=\"password\" required></label>\
         <input type=\"hidden\" name=\"callbackUrl\" value=\"{}\">\
         <button type=\"submit\">Sign in</button></form>",
        opt(query.callback_url.as_deref())
    );
    shell("Sign in", "", &body)
}

pub async fn dashboard_page(
    AdminSession(session): AdminSession,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let stats = views::dashboard_stats(state.repo.as_ref()).await?;
    let mut body = format!(
        "<h1>Dashboard</h1><p>Signed in as {}</p>\
         <table><thead><tr><th>Kind</th><th>Total</th><th>Active</th></tr></thead><tbody>",
        escape(&session.email)
    );
    for count in &stats.content {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&count.label),
            count.total,
            count.active
        );
    }
    let _ = write!(
        body,
        "</tbody></table><p>Enquiries: {} ({} new)</p>",
        stats.total_enquiries, stats.new_enquiries
    );
    Ok(shell("Dashboard", &admin_nav(), &body))
}

/// AdminNotice
///
/// Outcome flags the form endpoints append to the screen they redirect to.
#[derive(Debug, Default, Deserialize)]
pub struct AdminNotice {
    pub saved: Option<String>,
    pub deleted: Option<String>,
    pub error: Option<String>,
}

fn notice_html(notice: &AdminNotice) -> String {
    let mut out = String::new();
    if notice.saved.is_some() {
        out.push_str("<p class=\"notice\">Saved.</p>");
    }
    if notice.deleted.is_some() {
        out.push_str("<p class=\"notice\">Deleted.</p>");
    }
    if let Some(error) = &notice.error {
        let _ = write!(out, "<p class=\"error\">{}</p>", escape(error));
    }
    out
}

/// A one-button form; the admin screens use these for every state change.
fn post_button(action: &str, label: &str, hidden: &[(&str, &str)]) -> String {
    let mut out = format!(
        "<form method=\"post\" action=\"{}\" style=\"display:inline\">",
        escape(action)
    );
    for (name, value) in hidden {
        let _ = write!(
            out,
            "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
            escape(name),
            escape(value)
        );
    }
    let _ = write!(out, "<button type=\"submit\">{}</button></form>", escape(label));
    out
}

/// Field shown as the row title for a record of an unknown shape.
fn record_title(doc: &Value) -> String {
    ["title", "name", "company", "institution", "email"]
        .iter()
        .find_map(|field| doc.get(*field).and_then(Value::as_str))
        .unwrap_or("(untitled)")
        .to_string()
}

fn content_kind(segment: &str) -> Result<RecordKind, AppError> {
    RecordKind::from_segment(segment)
        .filter(|kind| *kind != RecordKind::Enquiry)
        .ok_or(AppError::NotFound)
}

/// content_table_page
///
/// Every record of one kind, inactive ones included, with links to edit each
/// record and a button to delete it.
pub async fn content_table_page(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(notice): Query<AdminNotice>,
) -> Result<Html<String>, AppError> {
    if RecordKind::from_segment(&segment) == Some(RecordKind::Enquiry) {
        return enquiries_table(&state, &notice).await;
    }
    let kind = content_kind(&segment)?;

    let query = ListQuery {
        sort: SortOrder::DisplayOrder,
        ..ListQuery::default()
    };
    let docs = state.repo.list(kind, &query).await?;
    let admin_base = format!("{ADMIN_HOME}/{}", kind.segment());
    let mut body = format!(
        "<h1>{}</h1>{}<p><a href=\"{admin_base}/new\">New</a></p>\
         <table><thead><tr><th>Title</th><th>Order</th><th>Active</th><th></th></tr></thead><tbody>",
        escape(kind.label()),
        notice_html(&notice)
    );
    for doc in &docs {
        let id = escape(doc.get("id").and_then(Value::as_str).unwrap_or(""));
        let delete = post_button(&format!("/api/{}/{id}/delete", kind.segment()), "Delete", &[]);
        let _ = write!(
            body,
            "<tr><td><a href=\"{admin_base}/{id}\">{}</a></td><td>{}</td><td>{}</td><td>{delete}</td></tr>",
            escape(&record_title(doc)),
            doc.get("display_order").and_then(Value::as_i64).unwrap_or(0),
            if doc.get("is_active").and_then(Value::as_bool).unwrap_or(true) { "yes" } else { "no" },
        );
    }
    body.push_str("</tbody></table>");
    Ok(shell(kind.label(), &admin_nav(), &body))
}

fn field_html(field: &FormField, doc: &Value) -> String {
    let current = doc.get(field.name);
    let value = escape(&forms::display_value(current));
    let required = if field.required { " required" } else { "" };
    let control = match field.kind {
        FieldKind::Text => format!("<input name=\"{}\" value=\"{value}\"{required}>", field.name),
        FieldKind::Date => {
            format!("<input type=\"date\" name=\"{}\" value=\"{value}\"{required}>", field.name)
        }
        FieldKind::Number => {
            format!("<input type=\"number\" name=\"{}\" value=\"{value}\"{required}>", field.name)
        }
        FieldKind::LongText | FieldKind::List => {
            format!("<textarea name=\"{}\"{required}>{value}</textarea>", field.name)
        }
        FieldKind::Flag => {
            let checked = if current.and_then(Value::as_bool).unwrap_or(false) { " checked" } else { "" };
            format!("<input type=\"checkbox\" name=\"{}\" value=\"on\"{checked}>", field.name)
        }
    };
    let hint = if field.kind == FieldKind::List { " (one per line)" } else { "" };
    format!("<p><label>{}{hint} {control}</label></p>", escape(field.label))
}

/// content_form_page
///
/// `/admin/{segment}/new` and `/admin/{segment}/{id}`: the create and edit
/// forms for one content kind, posting to the form endpoints under `/api`.
pub async fn content_form_page(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Path((segment, target)): Path<(String, String)>,
    Query(notice): Query<AdminNotice>,
) -> Result<Html<String>, AppError> {
    let kind = content_kind(&segment)?;
    let api_base = format!("/api/{}", kind.segment());

    let (heading, action, doc) = if target == "new" {
        (
            format!("New {}", kind.label()),
            format!("{api_base}/form"),
            json!({ "is_active": true }),
        )
    } else {
        let id: Uuid = target.parse().map_err(|_| AppError::NotFound)?;
        let doc = state.repo.get(kind, id).await?.ok_or(AppError::NotFound)?;
        (
            format!("Edit {}", record_title(&doc)),
            format!("{api_base}/{id}/form"),
            doc,
        )
    };

    let mut body = format!(
        "<h1>{}</h1>{}<form method=\"post\" action=\"{}\">",
        escape(&heading),
        notice_html(&notice),
        escape(&action)
    );
    for field in forms::fields(kind) {
        body.push_str(&field_html(&field, &doc));
    }
    let _ = write!(
        body,
        "<button type=\"submit\">Save</button> <a href=\"{ADMIN_HOME}/{}\">Cancel</a></form>",
        kind.segment()
    );
    Ok(shell(&heading, &admin_nav(), &body))
}

pub async fn enquiries_page(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
    Query(notice): Query<AdminNotice>,
) -> Result<Html<String>, AppError> {
    enquiries_table(&state, &notice).await
}

/// Status buttons for the transitions the workflow allows from the current state.
fn status_controls(enquiry: &Enquiry) -> String {
    let action = format!("/api/enquiries/{}/status", enquiry.id);
    EnquiryStatus::ALL
        .iter()
        .filter(|next| **next != enquiry.status && enquiry.status.can_transition_to(**next))
        .map(|next| post_button(&action, &format!("Mark {}", next.as_str()), &[("status", next.as_str())]))
        .collect::<Vec<_>>()
        .join(" ")
}

fn enquiry_row(enquiry: &Enquiry) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} {}</td></tr>",
        enquiry.created_at.format("%Y-%m-%d %H:%M"),
        escape(&enquiry.name),
        escape(&enquiry.email),
        opt(enquiry.subject.as_deref()),
        escape(&enquiry.message),
        enquiry.status.as_str(),
        status_controls(enquiry),
        post_button(&format!("/api/enquiries/{}/delete", enquiry.id), "Delete", &[])
    )
}

async fn enquiries_table(state: &AppState, notice: &AdminNotice) -> Result<Html<String>, AppError> {
    let items = enquiries::list(state.repo.as_ref(), None).await?;
    let mut body = format!(
        "<h1>Enquiries</h1>{}<table><thead><tr><th>Received</th><th>Name</th><th>Email</th>\
         <th>Subject</th><th>Message</th><th>Status</th><th></th></tr></thead><tbody>",
        notice_html(notice)
    );
    for enquiry in &items {
        body.push_str(&enquiry_row(enquiry));
    }
    body.push_str("</tbody></table>");
    Ok(shell("Enquiries", &admin_nav(), &body))
}

/// Unknown paths render a small not-found page for browsers.
pub async fn not_found_page(MaybeSession(session): MaybeSession) -> (StatusCode, Html<String>) {
    let (nav, home) = match session {
        Some(_) => (admin_nav(), ADMIN_HOME),
        None => (public_nav(), "/"),
    };
    let body = format!("<h1>Not found</h1><p><a href=\"{home}\">Back</a></p>");
    (StatusCode::NOT_FOUND, shell("Not found", &nav, &body))
}
