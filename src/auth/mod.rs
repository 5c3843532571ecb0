use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{
    config::{AppConfig, Env},
    errors::Error,
    models::{Role, User},
    repository::RepositoryState,
};

pub mod password;
pub mod session;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "blog_session";

/// Builds the Set-Cookie value that establishes a session.
pub fn session_cookie(token: &str, config: &AppConfig) -> String {
    let secure = if config.env == Env::Production {
        "; Secure"
    } else {
        ""
    };
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax{secure}; Max-Age={}",
        config.session_ttl_hours * 3600
    )
}

/// Builds the Set-Cookie value that tears a session down.
///
/// Safe to send whether or not a session exists, which is what makes logout
/// idempotent.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request: the user's id and role
/// as they currently stand in the store, not as they were when the session
/// token was minted.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

/// AdminUser Extractor Result
///
/// Proof that the request carries the administrative capability. Handlers
/// that mutate posts take this as an argument, so the gate cannot be
/// forgotten on a new mutation route.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: i64,
}

/// Pulls the session token out of the Cookie header, if any.
fn session_token_from_cookies(parts: &Parts) -> Option<String> {
    let cookie_header = parts.headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == SESSION_COOKIE {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Resolves the current session to a live user record.
///
/// The flow: read the session cookie, verify the token signature and expiry,
/// then look the subject up in the repository. The store lookup is the final
/// word; a valid token whose user no longer exists does not authenticate.
async fn resolve_session<S>(parts: &Parts, state: &S) -> Result<User, Error>
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let repo = RepositoryState::from_ref(state);
    let config = AppConfig::from_ref(state);

    let token = session_token_from_cookies(parts).ok_or(Error::Unauthenticated)?;
    let claims = session::verify_session_token(&token, &config)?;

    repo.get_user(claims.sub)
        .await?
        .ok_or(Error::Unauthenticated)
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument on any route that requires
/// a login. Rejection is 401 Unauthorized for every authentication failure
/// (missing cookie, bad or expired token, unknown user).
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = resolve_session(parts, state).await?;
        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

/// AdminUser Extractor Implementation
///
/// The authorization gate for post mutations. Every failure mode is the same
/// 403 Forbidden: a request with no session at all short-circuits here
/// without any identity comparison, and an authenticated non-admin gets an
/// indistinguishable response. Only genuine store/crypto failures surface
/// as 500s.
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = match resolve_session(parts, state).await {
            Ok(user) => user,
            Err(e @ (Error::Database(_) | Error::Internal { .. })) => return Err(e),
            Err(_) => return Err(Error::Forbidden),
        };

        if user.role != Role::Admin {
            return Err(Error::Forbidden);
        }

        Ok(AdminUser { id: user.id })
    }
}
