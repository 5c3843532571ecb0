use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer: profile access and commenting.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module. This guarantees that
/// all handlers receive a validated `AuthUser` struct containing the user's
/// ID and role. Anonymous requests are rejected with 401 before the handler
/// runs — commenting requires a login, but not the admin capability.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Retrieves the currently authenticated user's profile.
        .route("/me", get(handlers::get_me))
        // POST /posts/{id}/comments
        // Posts a new comment on a specified post. The comment body is
        // sanitized in the handler before persistence.
        .route("/posts/{id}/comments", post(handlers::add_comment))
}
