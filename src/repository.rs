use crate::errors::{Error, Result};
use crate::models::{BlogPost, Comment, CreatePostRequest, UpdatePostRequest, User};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, so handlers
/// interact with the data layer without knowing the concrete implementation
/// (Postgres in production, mocks in tests).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
///
/// Persistence failures are not swallowed here: every error propagates to
/// the calling handler and fails that one request.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users / Credential Store ---
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    // Creation is atomic with respect to email uniqueness: a concurrent
    // duplicate insert surfaces as DuplicateEmail, never as a second row.
    // The first user ever created receives the admin role.
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User>;

    // --- Posts ---
    // Public listing, newest first, with optional title/subtitle/body search.
    async fn list_posts(&self, search: Option<String>) -> Result<Vec<BlogPost>>;
    async fn get_post(&self, id: i64) -> Result<Option<BlogPost>>;
    async fn create_post(&self, req: CreatePostRequest, author_id: i64) -> Result<BlogPost>;
    // Partial update via COALESCE; None when the post does not exist.
    async fn update_post(&self, id: i64, req: UpdatePostRequest) -> Result<Option<BlogPost>>;
    // True if a row was deleted.
    async fn delete_post(&self, id: i64) -> Result<bool>;

    // --- Comments ---
    // None when the target post does not exist.
    async fn add_comment(&self, post_id: i64, user_id: i64, body: String) -> Result<Option<Comment>>;
    async fn get_comments(&self, post_id: i64) -> Result<Vec<Comment>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "p.id, p.author_id, u.name AS author_name, p.title, p.subtitle, \
     p.body, p.img_url, p.created_at, p.updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// create_user
    ///
    /// Inserts a new user. The role is decided inside the statement so the
    /// "first account becomes admin" rule holds even under concurrent
    /// registrations, and the unique index on email turns a duplicate insert
    /// into `DuplicateEmail` rather than a second row.
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3,
                    CASE WHEN EXISTS (SELECT 1 FROM users)
                         THEN 'reader'::user_role
                         ELSE 'admin'::user_role
                    END)
            RETURNING id, name, email, password_hash, role
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Error::DuplicateEmail,
            _ => Error::Database(e),
        })
    }

    /// list_posts
    ///
    /// Implements the optional search filter using QueryBuilder for safe
    /// parameterization; the search term never reaches the SQL text itself.
    async fn list_posts(&self, search: Option<String>) -> Result<Vec<BlogPost>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS} FROM blog_posts p JOIN users u ON u.id = p.author_id"
        ));

        if let Some(s) = search {
            // Case-insensitive search across title, subtitle, and body.
            let search_pattern = format!("%{}%", s);
            builder.push(" WHERE (p.title ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR p.subtitle ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR p.body ILIKE ");
            builder.push_bind(search_pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY p.created_at DESC");

        let posts = builder
            .build_query_as::<BlogPost>()
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> Result<Option<BlogPost>> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts p JOIN users u ON u.id = p.author_id \
             WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// create_post
    ///
    /// Uses a CTE to perform the insert and the author JOIN in one query,
    /// returning the enriched post row directly.
    async fn create_post(&self, req: CreatePostRequest, author_id: i64) -> Result<BlogPost> {
        let post = sqlx::query_as::<_, BlogPost>(
            r#"
            WITH inserted AS (
                INSERT INTO blog_posts (author_id, title, subtitle, body, img_url)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, author_id, title, subtitle, body, img_url, created_at, updated_at
            )
            SELECT i.id, i.author_id, u.name AS author_name, i.title, i.subtitle,
                   i.body, i.img_url, i.created_at, i.updated_at
            FROM inserted i JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(author_id)
        .bind(req.title)
        .bind(req.subtitle)
        .bind(req.body)
        .bind(req.img_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    /// update_post
    ///
    /// Uses the PostgreSQL `COALESCE` function to handle `Option<T>` fields,
    /// only updating a column if the corresponding field in `req` is `Some`.
    async fn update_post(&self, id: i64, req: UpdatePostRequest) -> Result<Option<BlogPost>> {
        let post = sqlx::query_as::<_, BlogPost>(
            r#"
            WITH updated AS (
                UPDATE blog_posts
                SET title = COALESCE($2, title),
                    subtitle = COALESCE($3, subtitle),
                    body = COALESCE($4, body),
                    img_url = COALESCE($5, img_url),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING id, author_id, title, subtitle, body, img_url, created_at, updated_at
            )
            SELECT i.id, i.author_id, u.name AS author_name, i.title, i.subtitle,
                   i.body, i.img_url, i.created_at, i.updated_at
            FROM updated i JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.subtitle)
        .bind(req.body)
        .bind(req.img_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// add_comment
    ///
    /// Inserts a new comment and immediately joins with `users` to return
    /// the enriched `Comment` row. A missing post shows up as a foreign-key
    /// violation, which is reported as `None` so the handler can 404.
    async fn add_comment(&self, post_id: i64, user_id: i64, body: String) -> Result<Option<Comment>> {
        let result = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, user_id, body)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, user_id, body, created_at
            )
            SELECT i.id, i.post_id, i.user_id, i.body, i.created_at,
                   u.name AS author_name, u.email AS author_email
            FROM inserted i JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(comment) => Ok(Some(comment)),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.post_id, c.user_id, c.body, c.created_at,
                   u.name AS author_name, u.email AS author_email
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}
