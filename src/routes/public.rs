use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in). These routes cover all read paths — posts and
/// comments are public content — plus the identity gateway (register, login,
/// logout) and the contact form.
///
/// Read paths are never gated: there is no hidden-post concept, so nothing
/// here needs a visibility check.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // New account creation. The response carries the session cookie, so a
        // fresh registration is immediately logged in.
        .route("/register", post(handlers::register))
        // POST /login
        // Credential verification and session establishment.
        .route("/login", post(handlers::login))
        // POST /logout
        // Session teardown via an expired cookie. Deliberately public so the
        // call is idempotent even when no session exists.
        .route("/logout", post(handlers::logout))
        // GET /posts?search=...
        // Lists all posts, supporting full-text search over title/subtitle/body.
        .route("/posts", get(handlers::get_posts))
        // GET /posts/{id}
        // Retrieves the detailed view of a single post.
        .route("/posts/{id}", get(handlers::get_post_details))
        // GET /posts/{id}/comments
        // Lists all associated comments for a specific post.
        .route("/posts/{id}/comments", get(handlers::get_comments))
        // POST /contact
        // Relays a visitor message to the blog owner by email.
        .route("/contact", post(handlers::contact))
}
