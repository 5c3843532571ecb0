use crate::{
    AppState,
    auth::{self, AdminUser, AuthUser, password, session},
    errors::Error,
    models::{
        self, AuthResponse, BlogPost, Comment, ContactRequest, CreateCommentRequest,
        CreatePostRequest, LoginRequest, MessageResponse, RegisterRequest, UpdatePostRequest,
        UserProfile,
    },
    sanitize::sanitize,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

// --- Filter Structs ---

/// PostFilter
///
/// Defines the accepted query parameters for the public post listing endpoint
/// (GET /posts). Used by Axum's Query extractor to safely bind HTTP query
/// parameters for full-text search.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PostFilter {
    /// Optional search string matched against post title, subtitle, and body.
    pub search: Option<String>,
}

// --- Read Handlers ---

/// get_posts
///
/// [Public Route] Lists all posts, newest first, with optional search.
/// Read paths are never gated; anonymous visitors see everything.
#[utoipa::path(
    get,
    path = "/posts",
    params(PostFilter),
    responses((status = 200, description = "List posts", body = [BlogPost]))
)]
pub async fn get_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<models::BlogPost>>, Error> {
    let posts = state.repo.list_posts(filter.search).await?;
    Ok(Json(posts))
}

/// get_post_details
///
/// [Public Route] Retrieves a single post by ID.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = BlogPost),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<models::BlogPost>, Error> {
    match state.repo.get_post(id).await? {
        Some(post) => Ok(Json(post)),
        None => Err(Error::NotFound { resource: "post" }),
    }
}

/// get_comments
///
/// [Public Route] Retrieves all comments for a given post ID, oldest first.
#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<models::Comment>>, Error> {
    let comments = state.repo.get_comments(post_id).await?;
    Ok(Json(comments))
}

// --- Auth Handlers ---

/// register
///
/// [Public Route] Creates a new account and immediately establishes a
/// session for it.
///
/// The raw password is hashed on a blocking thread (argon2 is deliberately
/// expensive) with a fresh salt per call. A duplicate email is rejected both
/// by the pre-insert lookup and, against concurrent registrations, by the
/// database unique constraint. The very first account created becomes the
/// blog's admin.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, Error> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(Error::BadRequest {
            message: "name, email and password are required".to_string(),
        });
    }

    if state
        .repo
        .find_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(Error::DuplicateEmail);
    }

    let raw_password = payload.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&raw_password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let user = state
        .repo
        .create_user(&payload.name, &payload.email, &password_hash)
        .await?;

    let token = session::create_session_token(&user, &state.config)?;
    let cookie = auth::session_cookie(&token, &state.config);

    let body = AuthResponse {
        user: UserProfile::from(&user),
        message: "Registration successful".to_string(),
    };

    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// login
///
/// [Public Route] Verifies credentials and establishes a session.
///
/// The failure is identical whether the email is unknown or the password is
/// wrong, so the endpoint cannot be used to enumerate accounts.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, Error> {
    let user = state
        .repo
        .find_user_by_email(&payload.email)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    // Verify on a blocking thread to avoid stalling the async runtime.
    let raw_password = payload.password.clone();
    let stored_hash = user.password_hash.clone();
    let is_valid =
        tokio::task::spawn_blocking(move || password::verify_password(&raw_password, &stored_hash))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password verification task: {e}"),
            })??;

    if !is_valid {
        return Err(Error::InvalidCredentials);
    }

    let token = session::create_session_token(&user, &state.config)?;
    let cookie = auth::session_cookie(&token, &state.config);

    let body = AuthResponse {
        user: UserProfile::from(&user),
        message: "Login successful".to_string(),
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// logout
///
/// [Public Route] Ends the session by expiring the cookie. Idempotent:
/// calling it without a session is harmless and succeeds the same way.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout() -> Response {
    let body = MessageResponse {
        message: "Logged out".to_string(),
    };

    (
        StatusCode::OK,
        [(header::SET_COOKIE, auth::clear_session_cookie())],
        Json(body),
    )
        .into_response()
}

/// get_me
///
/// [Authenticated Route] Provides the authenticated user's profile
/// information, re-read from the store.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, Error> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(Error::Unauthenticated)?;
    Ok(Json(UserProfile::from(&user)))
}

// --- Comment Handlers ---

/// add_comment
///
/// [Authenticated Route] Posts a new comment on a post. The body is rich
/// text and passes through the sanitizer before it is persisted; the stored
/// form is final and is served back verbatim.
#[utoipa::path(
    post,
    path = "/posts/{id}/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment Added", body = Comment),
        (status = 404, description = "Post Not Found")
    )
)]
pub async fn add_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<models::Comment>), Error> {
    if payload.body.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "comment body is required".to_string(),
        });
    }

    let clean_body = sanitize(&payload.body);

    match state.repo.add_comment(post_id, user_id, clean_body).await? {
        Some(comment) => Ok((StatusCode::CREATED, Json(comment))),
        None => Err(Error::NotFound { resource: "post" }),
    }
}

// --- Admin Handlers ---

/// create_post
///
/// [Admin Route] Handles the submission of a new post. The `AdminUser`
/// argument is the authorization gate: any request without an admin session
/// is rejected with 403 before this body runs. The post body is sanitized
/// here, at write time.
#[utoipa::path(
    post,
    path = "/admin/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = BlogPost),
        (status = 403, description = "Not Admin")
    )
)]
pub async fn create_post(
    AdminUser { id: author_id }: AdminUser,
    State(state): State<AppState>,
    Json(mut payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<models::BlogPost>), Error> {
    if payload.title.trim().is_empty() || payload.body.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "title and body are required".to_string(),
        });
    }

    payload.body = sanitize(&payload.body);

    let post = state.repo.create_post(payload, author_id).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Admin Route] Modifies an existing post. Only fields present in the
/// payload are changed; a provided body is sanitized before persistence,
/// exactly as on create.
#[utoipa::path(
    put,
    path = "/admin/posts/{id}",
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = BlogPost),
        (status = 403, description = "Not Admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    AdminUser { .. }: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut payload): Json<UpdatePostRequest>,
) -> Result<Json<models::BlogPost>, Error> {
    if let Some(body) = payload.body.take() {
        payload.body = Some(sanitize(&body));
    }

    match state.repo.update_post(id, payload).await? {
        Some(post) => Ok(Json(post)),
        None => Err(Error::NotFound { resource: "post" }),
    }
}

/// delete_post
///
/// [Admin Route] Removes a post and, via the cascade, its comments.
#[utoipa::path(
    delete,
    path = "/admin/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not Admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    AdminUser { .. }: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Error> {
    if state.repo.delete_post(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound { resource: "post" })
    }
}

// --- Contact Handler ---

/// contact
///
/// [Public Route] Relays a visitor message to the blog owner by email.
///
/// The relay is fire-and-forget: a transport failure is logged server-side
/// but the visitor is still told the message was sent. There is exactly one
/// attempt and no delivery guarantee.
#[utoipa::path(
    post,
    path = "/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Accepted", body = MessageResponse),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<Json<MessageResponse>, Error> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.message.trim().is_empty()
    {
        return Err(Error::BadRequest {
            message: "Please fill out all required fields.".to_string(),
        });
    }

    if let Err(e) = state.mailer.send_contact(&payload).await {
        tracing::error!("failed to relay contact message: {e}");
    }

    Ok(Json(MessageResponse {
        message: "Your message has been sent successfully!".to_string(),
    }))
}
