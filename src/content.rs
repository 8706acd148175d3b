use chrono::{NaiveDate, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, RepoError},
    models::{
        Achievement, Bio, CarouselSlide, ContactInfo, Education, Experience, Project, RecordKind,
        ReorderEntry, Service, Skill,
    },
    repository::{ListQuery, Repository},
};

/// Fields the server owns; client-supplied values for them are ignored.
pub const PROTECTED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Content Contract
///
/// Implemented by each of the admin-managed content kinds. The CRUD operations
/// below are written once against this trait and applied to every kind.
pub trait Content: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: RecordKind;

    fn id(&self) -> Uuid;
    fn is_active(&self) -> bool;

    /// Field-level checks beyond what deserialization enforces.
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }
}

// --- Validation helpers ---

pub(crate) fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

pub(crate) fn check_url(field: &str, value: Option<&str>) -> Result<(), AppError> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(());
    };
    // Root-relative asset paths are allowed alongside absolute links.
    if value.starts_with('/') && !value.starts_with("//") {
        return Ok(());
    }
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(AppError::validation(format!("{field} must be an http(s) URL"))),
    }
}

/// Loose shape check: `local@domain.tld`, no whitespace.
pub fn is_plausible_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        }
        None => false,
    }
}

fn check_period(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), AppError> {
    match end {
        Some(end) if end < start => Err(AppError::validation("end_date must not precede start_date")),
        _ => Ok(()),
    }
}

// --- Kind implementations ---

macro_rules! content_identity {
    ($kind:expr) => {
        const KIND: RecordKind = $kind;

        fn id(&self) -> Uuid {
            self.id
        }

        fn is_active(&self) -> bool {
            self.is_active
        }
    };
}

impl Content for Bio {
    content_identity!(RecordKind::Bio);

    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("headline", &self.headline)?;
        check_url("avatar_url", self.avatar_url.as_deref())?;
        check_url("resume_url", self.resume_url.as_deref())
    }
}

impl Content for Experience {
    content_identity!(RecordKind::Experience);

    fn validate(&self) -> Result<(), AppError> {
        require("company", &self.company)?;
        require("role", &self.role)?;
        check_period(self.start_date, self.end_date)
    }
}

impl Content for Education {
    content_identity!(RecordKind::Education);

    fn validate(&self) -> Result<(), AppError> {
        require("institution", &self.institution)?;
        require("degree", &self.degree)?;
        check_period(self.start_date, self.end_date)
    }
}

impl Content for Achievement {
    content_identity!(RecordKind::Achievement);

    fn validate(&self) -> Result<(), AppError> {
        require("title", &self.title)?;
        check_url("url", self.url.as_deref())
    }
}

impl Content for Skill {
    content_identity!(RecordKind::Skill);

    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("category", &self.category)?;
        match self.proficiency {
            Some(level) if level > 100 => Err(AppError::validation("proficiency must be between 0 and 100")),
            _ => Ok(()),
        }
    }
}

impl Content for Service {
    content_identity!(RecordKind::Service);

    fn validate(&self) -> Result<(), AppError> {
        require("title", &self.title)
    }
}

impl Content for Project {
    content_identity!(RecordKind::Project);

    fn validate(&self) -> Result<(), AppError> {
        require("title", &self.title)?;
        check_url("image_url", self.image_url.as_deref())?;
        check_url("live_url", self.live_url.as_deref())?;
        check_url("source_url", self.source_url.as_deref())
    }
}

impl Content for CarouselSlide {
    content_identity!(RecordKind::CarouselSlide);

    fn validate(&self) -> Result<(), AppError> {
        require("title", &self.title)?;
        require("image_url", &self.image_url)?;
        check_url("image_url", Some(&self.image_url))?;
        check_url("link_url", self.link_url.as_deref())
    }
}

impl Content for ContactInfo {
    content_identity!(RecordKind::ContactInfo);

    fn validate(&self) -> Result<(), AppError> {
        if !is_plausible_email(&self.email) {
            return Err(AppError::validation("email must be a valid address"));
        }
        check_url("linkedin_url", self.linkedin_url.as_deref())?;
        check_url("github_url", self.github_url.as_deref())?;
        check_url("website_url", self.website_url.as_deref())
    }
}

// --- Document plumbing ---

/// Decodes a stored document. A document that no longer matches its type is a
/// storage fault, not a client error.
pub fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, AppError> {
    serde_json::from_value(doc).map_err(|e| AppError::Storage(RepoError::from(e)))
}

fn into_object(input: Value) -> Result<Map<String, Value>, AppError> {
    match input {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::validation("request body must be a JSON object")),
    }
}

fn strip_protected(map: &mut Map<String, Value>) {
    for field in PROTECTED_FIELDS {
        map.remove(field);
    }
}

/// Deserializes a candidate document, validates it and returns it together
/// with its normalized JSON form (unknown keys dropped, defaults filled in).
fn build<K: Content>(doc: Map<String, Value>) -> Result<(K, Value), AppError> {
    let record: K = serde_json::from_value(Value::Object(doc))?;
    record.validate()?;
    let normalized = serde_json::to_value(&record).map_err(RepoError::from)?;
    Ok((record, normalized))
}

// --- Operations ---

/// list
///
/// All records of a kind in display order. Inactive records are included only
/// when `include_inactive` is set.
pub async fn list<K: Content>(repo: &dyn Repository, include_inactive: bool) -> Result<Vec<K>, AppError> {
    let query = if include_inactive {
        ListQuery::default()
    } else {
        ListQuery::active()
    };
    repo.list(K::KIND, &query)
        .await?
        .into_iter()
        .map(decode::<K>)
        .collect()
}

/// First active record of a kind, for singleton-like content (bio, contact info).
pub async fn first_active<K: Content>(repo: &dyn Repository) -> Result<Option<K>, AppError> {
    Ok(list::<K>(repo, false).await?.into_iter().next())
}

pub async fn get<K: Content>(repo: &dyn Repository, id: Uuid, include_inactive: bool) -> Result<K, AppError> {
    let doc = repo.get(K::KIND, id).await?.ok_or(AppError::NotFound)?;
    let record: K = decode(doc)?;
    if !include_inactive && !record.is_active() {
        return Err(AppError::NotFound);
    }
    Ok(record)
}

/// create
///
/// Builds a record from a client JSON object. The server assigns `id` and
/// timestamps; missing optional fields take their defaults.
pub async fn create<K: Content>(repo: &dyn Repository, input: Value) -> Result<K, AppError> {
    let mut doc = into_object(input)?;
    strip_protected(&mut doc);

    let id = Uuid::new_v4();
    let now = serde_json::to_value(Utc::now()).map_err(RepoError::from)?;
    doc.insert("id".to_string(), Value::String(id.to_string()));
    doc.insert("created_at".to_string(), now.clone());
    doc.insert("updated_at".to_string(), now);

    let (record, normalized) = build::<K>(doc)?;
    repo.insert(K::KIND, id, normalized).await?;
    tracing::info!(kind = K::KIND.as_str(), %id, "content created");
    Ok(record)
}

/// Stored document for `id` with `changes` merged over its top-level keys and
/// `updated_at` refreshed, already validated. Nothing is written.
async fn merged<K: Content>(
    repo: &dyn Repository,
    id: Uuid,
    mut changes: Map<String, Value>,
) -> Result<(K, Value), AppError> {
    strip_protected(&mut changes);

    let stored = repo.get(K::KIND, id).await?.ok_or(AppError::NotFound)?;
    let mut doc = match stored {
        Value::Object(map) => map,
        _ => {
            return Err(AppError::Internal(format!(
                "stored {} {id} is not an object",
                K::KIND.as_str()
            )));
        }
    };
    doc.extend(changes);
    doc.insert(
        "updated_at".to_string(),
        serde_json::to_value(Utc::now()).map_err(RepoError::from)?,
    );
    build::<K>(doc)
}

/// update
///
/// Partial update: each top-level key of `patch` replaces the stored value.
/// `id` and `created_at` never change; the result is revalidated as a whole.
pub async fn update<K: Content>(repo: &dyn Repository, id: Uuid, patch: Value) -> Result<K, AppError> {
    let (record, normalized) = merged::<K>(repo, id, into_object(patch)?).await?;
    repo.update(K::KIND, id, normalized)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(kind = K::KIND.as_str(), %id, "content updated");
    Ok(record)
}

pub async fn delete<K: Content>(repo: &dyn Repository, id: Uuid) -> Result<(), AppError> {
    if repo.delete(K::KIND, id).await? {
        tracing::info!(kind = K::KIND.as_str(), %id, "content deleted");
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// reorder
///
/// Applies new display positions. Every listed id must exist and every
/// repositioned record must still validate before anything is written; the
/// full list (including inactive records) is returned in its new order.
pub async fn reorder<K: Content>(repo: &dyn Repository, entries: Vec<ReorderEntry>) -> Result<Vec<K>, AppError> {
    let mut staged = Vec::with_capacity(entries.len());
    for entry in &entries {
        let mut changes = Map::new();
        changes.insert("display_order".to_string(), Value::from(entry.display_order));
        let (_, normalized) = merged::<K>(repo, entry.id, changes)
            .await
            .map_err(|err| match err {
                AppError::NotFound => {
                    AppError::validation(format!("unknown {} id {}", K::KIND.as_str(), entry.id))
                }
                other => other,
            })?;
        staged.push((entry.id, normalized));
    }

    for (id, normalized) in staged {
        repo.update(K::KIND, id, normalized)
            .await?
            .ok_or(AppError::NotFound)?;
    }
    tracing::info!(kind = K::KIND.as_str(), count = entries.len(), "content reordered");
    list::<K>(repo, true).await
}
