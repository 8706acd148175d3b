use chrono::Utc;
use uuid::Uuid;

use crate::{
    content::{decode, is_plausible_email},
    error::{AppError, RepoError},
    models::{CreateEnquiryRequest, Enquiry, EnquiryStatus, RecordKind},
    repository::{ListQuery, Repository},
};

pub const MAX_NAME_CHARS: usize = 120;
pub const MAX_SUBJECT_CHARS: usize = 200;
pub const MAX_MESSAGE_CHARS: usize = 5000;

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

/// validate_submission
///
/// Trims the visitor's input and checks field limits. Returns the cleaned
/// request; a blank subject becomes `None`.
pub fn validate_submission(input: CreateEnquiryRequest) -> Result<CreateEnquiryRequest, AppError> {
    let name = input.name.trim().to_string();
    let email = input.email.trim().to_string();
    let subject = input
        .subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let message = input.message.trim().to_string();

    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if too_long(&name, MAX_NAME_CHARS) {
        return Err(AppError::validation(format!("name must be at most {MAX_NAME_CHARS} characters")));
    }
    if !is_plausible_email(&email) {
        return Err(AppError::validation("email must be a valid address"));
    }
    if subject.as_deref().is_some_and(|s| too_long(s, MAX_SUBJECT_CHARS)) {
        return Err(AppError::validation(format!(
            "subject must be at most {MAX_SUBJECT_CHARS} characters"
        )));
    }
    if message.is_empty() {
        return Err(AppError::validation("message is required"));
    }
    if too_long(&message, MAX_MESSAGE_CHARS) {
        return Err(AppError::validation(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    Ok(CreateEnquiryRequest {
        name,
        email,
        subject,
        message,
    })
}

/// submit
///
/// Stores a validated contact-form submission with status `new`.
pub async fn submit(repo: &dyn Repository, input: CreateEnquiryRequest) -> Result<Enquiry, AppError> {
    let clean = validate_submission(input)?;
    let now = Utc::now();
    let enquiry = Enquiry {
        id: Uuid::new_v4(),
        name: clean.name,
        email: clean.email,
        subject: clean.subject,
        message: clean.message,
        status: EnquiryStatus::New,
        created_at: now,
        updated_at: now,
    };
    let doc = serde_json::to_value(&enquiry).map_err(RepoError::from)?;
    repo.insert(RecordKind::Enquiry, enquiry.id, doc).await?;
    tracing::info!(enquiry_id = %enquiry.id, "enquiry received");
    Ok(enquiry)
}

/// Enquiries newest first, optionally restricted to one status.
pub async fn list(repo: &dyn Repository, status: Option<EnquiryStatus>) -> Result<Vec<Enquiry>, AppError> {
    let mut query = ListQuery::newest_first();
    if let Some(status) = status {
        query = query.with_field("status", status.as_str());
    }
    repo.list(RecordKind::Enquiry, &query)
        .await?
        .into_iter()
        .map(decode::<Enquiry>)
        .collect()
}

pub async fn get(repo: &dyn Repository, id: Uuid) -> Result<Enquiry, AppError> {
    let doc = repo
        .get(RecordKind::Enquiry, id)
        .await?
        .ok_or(AppError::NotFound)?;
    decode(doc)
}

/// set_status
///
/// Moves an enquiry through its workflow. Setting the current status again is
/// a no-op; a transition the workflow does not permit is a conflict.
pub async fn set_status(repo: &dyn Repository, id: Uuid, next: EnquiryStatus) -> Result<Enquiry, AppError> {
    let mut enquiry = get(repo, id).await?;
    if enquiry.status == next {
        return Ok(enquiry);
    }
    if !enquiry.status.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "cannot move enquiry from {} to {}",
            enquiry.status.as_str(),
            next.as_str()
        )));
    }

    let previous = enquiry.status;
    enquiry.status = next;
    enquiry.updated_at = Utc::now();
    let doc = serde_json::to_value(&enquiry).map_err(RepoError::from)?;
    repo.update(RecordKind::Enquiry, id, doc)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(
        enquiry_id = %id,
        from = previous.as_str(),
        to = next.as_str(),
        "enquiry status changed"
    );
    Ok(enquiry)
}

pub async fn delete(repo: &dyn Repository, id: Uuid) -> Result<(), AppError> {
    if repo.delete(RecordKind::Enquiry, id).await? {
        tracing::info!(enquiry_id = %id, "enquiry deleted");
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// Deletes every listed enquiry that exists. Unknown ids are skipped.
pub async fn bulk_delete(repo: &dyn Repository, ids: &[Uuid]) -> Result<u64, AppError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let deleted = repo.delete_many(RecordKind::Enquiry, ids).await?;
    tracing::info!(requested = ids.len(), deleted, "enquiries bulk deleted");
    Ok(deleted)
}
