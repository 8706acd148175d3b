use reqwest::Url;
use std::env;

/// AppConfig
///
/// Holds the service configuration, loaded once at startup and shared read-only
/// through the application state (pulled into handlers via FromRef).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls which settings are mandatory.
    pub env: Env,
    // Postgres connection string. `None` selects the in-memory record store (local only).
    pub db_url: Option<String>,
    // HMAC secret used to sign and verify admin session tokens.
    pub session_secret: String,
    // Lifetime of an issued session token, in seconds.
    pub session_ttl_secs: u64,
    // Canonical public origin of the site. Used whenever the Host header cannot be trusted.
    pub public_base_url: Option<Url>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Bootstrap credentials for the single admin account.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

/// Env
///
/// Runtime context: `Local` tolerates missing infrastructure settings,
/// `Production` refuses to start without them.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const LOCAL_SESSION_SECRET: &str = "folio-local-session-secret-change-me";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests. No canonical URL and no database.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            public_base_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            admin_email: None,
            admin_password: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics when a setting required for the current environment is missing
    /// (`DATABASE_URL` and `SESSION_SECRET` in production) or when
    /// `PUBLIC_BASE_URL` is set but is not an absolute http(s) URL.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let session_secret = match env {
            Env::Production => env::var("SESSION_SECRET")
                .expect("FATAL: SESSION_SECRET must be set in production."),
            Env::Local => {
                env::var("SESSION_SECRET").unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string())
            }
        };

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production"),
            ),
            Env::Local => env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
        };

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|raw| {
                parse_base_url(raw.trim())
                    .expect("FATAL: PUBLIC_BASE_URL must be an absolute http(s) URL")
            });

        Self {
            env,
            db_url,
            session_secret,
            session_ttl_secs,
            public_base_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Parses a canonical base URL, keeping only its origin.
pub fn parse_base_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Url::parse(&url.origin().ascii_serialization()).ok()
}

#[cfg(test)]
mod tests {
    use super::parse_base_url;

    #[test]
    fn base_url_is_reduced_to_origin() {
        let url = parse_base_url("https://myportfolio.example/some/path?x=1").unwrap();
        assert_eq!(url.as_str(), "https://myportfolio.example/");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        assert!(parse_base_url("ftp://myportfolio.example").is_none());
        assert!(parse_base_url("/relative").is_none());
    }
}
