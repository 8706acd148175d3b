use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{PasswordHash, SaltString},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::Utc;
use reqwest::Url;
use std::convert::Infallible;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{RecordKind, User},
    policy::LOGIN_PATH,
    redirect::callback_or,
    repository::{ListQuery, Repository, RepositoryState},
    session::{ADMIN_ROLE, Session, SessionState, SessionStore, session_token},
};

// --- Extractors ---

/// AdminSession Extractor
///
/// Resolves the signed-in admin for a handler. The access gate stores the
/// validated session in the request extensions; when a handler is reached
/// without the gate (direct router tests, routes the gate allows), the token is
/// validated here instead.
///
/// Rejection: `AppError::Unauthorized` (401) when there is no live session.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        resolve_session(parts, state)
            .await
            .map(AdminSession)
            .ok_or(AppError::Unauthorized)
    }
}

/// MaybeSession Extractor
///
/// Like `AdminSession` but never rejects: anonymous requests get `None`.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(resolve_session(parts, state).await))
    }
}

async fn resolve_session<S>(parts: &Parts, state: &S) -> Option<Session>
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    if let Some(session) = parts.extensions.get::<Session>() {
        return Some(session.clone());
    }
    let token = session_token(&parts.headers)?;
    let sessions = SessionState::from_ref(state);
    sessions.validate(&token).await
}

// --- Passwords ---

/// hash_password
///
/// Argon2id PHC string with a random 16-byte salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AppError::Internal(format!("salt generation failed: {e}")))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("salt encoding failed: {e}")))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?
        .to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// --- Credential Exchange ---

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn find_user_by_email(repo: &dyn Repository, email: &str) -> Result<Option<User>, AppError> {
    let query = ListQuery::default().with_field("email", normalize_email(email));
    let docs = repo.list(RecordKind::User, &query).await?;
    match docs.into_iter().next() {
        Some(doc) => Ok(Some(serde_json::from_value(doc).map_err(crate::error::RepoError::from)?)),
        None => Ok(None),
    }
}

/// authenticate
///
/// Checks email and password against the stored admin account. Unknown email
/// and wrong password are indistinguishable to the caller.
pub async fn authenticate(
    repo: &dyn Repository,
    email: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = find_user_by_email(repo, email).await? else {
        tracing::info!("sign-in rejected: unknown account");
        return Ok(None);
    };
    if user.role != ADMIN_ROLE || !verify_password(&user.password_hash, password) {
        tracing::info!(user_id = %user.id, "sign-in rejected: bad credentials");
        return Ok(None);
    }
    Ok(Some(user))
}

/// ensure_admin
///
/// Creates the admin account if no user with `email` exists yet. Existing
/// accounts are left untouched. Returns the account.
pub async fn ensure_admin(repo: &RepositoryState, email: &str, password: &str) -> Result<User, AppError> {
    if let Some(existing) = find_user_by_email(repo.as_ref(), email).await? {
        return Ok(existing);
    }
    let user = User {
        id: Uuid::new_v4(),
        email: normalize_email(email),
        password_hash: hash_password(password)?,
        role: ADMIN_ROLE.to_string(),
        created_at: Utc::now(),
    };
    let doc = serde_json::to_value(&user).map_err(crate::error::RepoError::from)?;
    repo.insert(RecordKind::User, user.id, doc).await?;
    tracing::info!(user_id = %user.id, "admin account created");
    Ok(user)
}

/// SignOut
///
/// Outcome of ending a session: where to send the browser next.
#[derive(Debug, Clone, PartialEq)]
pub struct SignOut {
    pub revoked: bool,
    pub redirect_to: String,
}

/// sign_out
///
/// Invalidates the session token (if any) and returns the redirect target:
/// the sanitized callback, or the login page.
pub async fn sign_out(
    sessions: &dyn SessionStore,
    token: Option<&str>,
    callback: Option<&str>,
    app_base: &Url,
) -> SignOut {
    let revoked = match token {
        Some(token) => sessions.revoke(token).await,
        None => false,
    };
    SignOut {
        revoked,
        redirect_to: callback_or(callback, LOGIN_PATH, app_base),
    }
}
