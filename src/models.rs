use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The capability field on a user record. Exactly one user holds the `Admin`
/// role under the registration flow: the first account ever created. Every
/// later account is a `Reader`, which may comment but never mutate posts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    Reader,
}

/// User
///
/// The canonical identity record stored in the `users` table, including the
/// salted password hash. This struct is internal: it is never serialized into
/// a response. Handlers convert it to `UserProfile` before returning it.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub name: String,
    // The login identifier; uniqueness is enforced by the database.
    pub email: String,
    // Argon2id PHC string, embedding its own salt and parameters.
    pub password_hash: String,
    pub role: Role,
}

/// BlogPost
///
/// A post record from the `blog_posts` table, enriched with the author's
/// display name via a JOIN. The `body` field holds sanitized HTML: filtering
/// happens once at write time, so reads return the stored form untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct BlogPost {
    pub id: i64,
    // FK to users.id (the admin who wrote the post).
    pub author_id: i64,
    // Loaded via a JOIN against `users`.
    #[sqlx(default)]
    pub author_name: String,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    // Optional header image URL shown above the post.
    pub img_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Comment
///
/// A comment record from the `comments` table, augmented with the author's
/// name and email (a JOIN). The email is what the frontend feeds its avatar
/// widget; the body is sanitized HTML, stored clean like post bodies.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    // BigInt (i64) comment IDs, matching the BIGSERIAL column.
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub body: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    pub author_name: String,
    #[sqlx(default)]
    pub author_email: String,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /register).
/// The raw password only ever reaches the hashing routine; it is never
/// persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreatePostRequest
///
/// Input payload for submitting a new post (POST /admin/posts). The body is
/// rich text from the editor; the handler sanitizes it before it reaches the
/// repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: Option<String>,
}

/// UpdatePostRequest
///
/// Partial update payload for modifying an existing post (PUT /admin/posts/{id}).
/// Uses `Option<T>` for all fields so only provided fields are touched; the
/// repository maps this onto `COALESCE` columns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
}

/// CreateCommentRequest
///
/// Input payload for posting a new comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub body: String,
}

/// ContactRequest
///
/// Input payload for the contact form (POST /contact). Relayed by email to
/// the configured recipient and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

// --- Response Schemas (Output) ---

/// UserProfile
///
/// The public projection of a user record (GET /me and auth responses).
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    // Dynamic URL for a profile image/avatar.
    pub avatar_url: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            // Using the DiceBear API for stable, unique avatar generation based on the user ID.
            avatar_url: Some(format!(
                "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
                user.id
            )),
        }
    }
}

/// AuthResponse
///
/// Output schema for register/login: the authenticated user's profile plus a
/// human-readable status line. The session cookie travels in the headers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub message: String,
}

/// MessageResponse
///
/// Minimal status payload used by logout and the contact form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}
