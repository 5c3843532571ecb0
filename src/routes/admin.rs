use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively available to the administrative account:
/// every path that mutates posts.
///
/// Access Control:
/// This router is deliberately NOT wrapped in the authentication middleware.
/// Each handler takes the `AdminUser` extractor, which rejects every
/// non-admin request — including requests with no session at all — with the
/// same 403 Forbidden. That keeps the response identical for "not logged in"
/// and "logged in but not admin", and means a new mutation route cannot be
/// added without naming its gate.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/posts
        // Creates a new post. The body is sanitized at write time.
        .route("/posts", post(handlers::create_post))
        // PUT /admin/posts/{id}
        // Partially updates an existing post; a provided body is re-sanitized.
        .route("/posts/{id}", put(handlers::update_post))
        // DELETE /admin/posts/{id}
        // Removes a post and its comments.
        .route("/posts/{id}", delete(handlers::delete_post))
}
