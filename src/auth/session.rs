//! Session token creation and verification.
//!
//! A session is a signed JWT carried in an HttpOnly cookie. The token binds
//! the request context to exactly one user id; every authenticated request
//! re-resolves that id against the repository, so a stale token for a
//! deleted account stops working immediately.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, errors::Error, models::{Role, User}};

/// SessionClaims
///
/// The payload signed into the session token. `sub` is the user id; the role
/// is advisory only (authorization re-reads it from the store on every
/// request).
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i64,
    pub role: Role,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiration time; tokens past this instant are rejected.
    pub exp: i64,
}

impl SessionClaims {
    fn new(user: &User, config: &AppConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.session_ttl_hours);

        Self {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }
}

/// Create a signed session token for a freshly authenticated user.
pub fn create_session_token(user: &User, config: &AppConfig) -> Result<String, Error> {
    let claims = SessionClaims::new(user, config);
    let key = EncodingKey::from_secret(config.session_secret.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create session token: {e}"),
    })
}

/// Verify and decode a session token.
///
/// Every decode failure is reported uniformly as `Unauthenticated`: the
/// token came from the client, so an expired signature and a forged one get
/// the same answer.
pub fn verify_session_token(token: &str, config: &AppConfig) -> Result<SessionClaims, Error> {
    let key = DecodingKey::from_secret(config.session_secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Token expired: the most common failure for a valid-but-old cookie.
        ErrorKind::ExpiredSignature => Error::Unauthenticated,
        // Catch all other failure types (bad signature, malformed token, etc.).
        _ => Error::Unauthenticated,
    })?;

    Ok(token_data.claims)
}
