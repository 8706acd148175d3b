use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::AppError, models::User};

/// The only privileged role.
pub const ADMIN_ROLE: &str = "admin";

/// Upper bound on a session lifetime (one year).
pub const MAX_TTL_SECS: u64 = 60 * 60 * 24 * 365;

/// Name of the browser session cookie.
pub const SESSION_COOKIE: &str = "folio_session";

/// Claims
///
/// Payload of a session token. Signed with the configured session secret and
/// validated on every request that carries one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the admin user's id.
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
    /// Token id, the handle used for revocation at sign-out.
    pub jti: Uuid,
}

/// Session
///
/// A validated admin session. Passed explicitly into every access decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// IssuedSession
///
/// Result of a successful credential exchange: the opaque token handed to the
/// client plus the session it stands for.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

/// SessionStore Contract
///
/// Issues, validates and revokes admin session tokens. Validation never
/// errors: anything that is not a live admin session is `None`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn issue(&self, user: &User) -> Result<IssuedSession, AppError>;
    async fn validate(&self, token: &str) -> Option<Session>;
    /// Returns true when a live token was revoked.
    async fn revoke(&self, token: &str) -> bool;
}

/// SessionState
pub type SessionState = Arc<dyn SessionStore>;

/// JwtSessionStore
///
/// HS256-signed tokens plus an in-process revocation list keyed by token id.
/// Revoked ids are dropped from the list once their token would have expired
/// anyway.
pub struct JwtSessionStore {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    revoked: RwLock<HashMap<Uuid, usize>>,
}

impl JwtSessionStore {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs.clamp(1, MAX_TTL_SECS) as i64),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation
    }

    fn decode_claims(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Self::validation()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("session token rejected: {:?}", e.kind());
                None
            }
        }
    }
}

fn to_datetime(secs: usize) -> DateTime<Utc> {
    Utc.timestamp_opt(secs as i64, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

#[async_trait]
impl SessionStore for JwtSessionStore {
    async fn issue(&self, user: &User) -> Result<IssuedSession, AppError> {
        if user.role != ADMIN_ROLE {
            return Err(AppError::Forbidden);
        }

        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now.timestamp().max(0) as usize,
            exp: expires_at.timestamp().max(0) as usize,
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign session token: {e}")))?;

        Ok(IssuedSession {
            token,
            session: Session {
                user_id: claims.sub,
                email: claims.email,
                role: claims.role,
                token_id: claims.jti,
                expires_at: to_datetime(claims.exp),
            },
        })
    }

    async fn validate(&self, token: &str) -> Option<Session> {
        let claims = self.decode_claims(token)?;
        if claims.role != ADMIN_ROLE {
            return None;
        }
        if self.revoked.read().await.contains_key(&claims.jti) {
            return None;
        }
        Some(Session {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            token_id: claims.jti,
            expires_at: to_datetime(claims.exp),
        })
    }

    async fn revoke(&self, token: &str) -> bool {
        let Some(claims) = self.decode_claims(token) else {
            return false;
        };
        let now = Utc::now().timestamp().max(0) as usize;
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp >= now);
        revoked.insert(claims.jti, claims.exp).is_none()
    }
}

// --- Token Transport ---

/// session_token
///
/// Reads the session token from `Authorization: Bearer …`, falling back to the
/// session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Set-Cookie value carrying a freshly issued token.
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Set-Cookie value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}
