use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
};
use blog_portal::{
    AppState,
    auth::{AdminUser, AuthUser, password},
    config::AppConfig,
    email::MockMailer,
    errors::{Error, Result},
    handlers,
    models::{
        BlogPost, Comment, ContactRequest, CreateCommentRequest, CreatePostRequest, LoginRequest,
        RegisterRequest, Role, UpdatePostRequest, User,
    },
    repository::Repository,
};
use std::sync::{Arc, Mutex};

// --- MOCK REPOSITORY IMPLEMENTATION ---

// This struct is the central control point for testing handler logic.
// Handlers rely on traits, so we mock the trait implementation. The
// `recorded_*` fields capture what handlers actually hand the persistence
// layer, which is how the write-time sanitization contract is asserted.
#[derive(Default)]
pub struct MockRepoControl {
    // Pre-canned outputs for handler requests
    pub user_by_email: Option<User>,
    pub user_by_id: Option<User>,
    pub created_user: Option<User>,
    pub post_to_return: Option<BlogPost>,
    pub posts_to_return: Vec<BlogPost>,
    pub comments_to_return: Vec<Comment>,
    pub delete_post_result: bool,
    pub add_comment_succeeds: bool,

    // Inputs captured for verification
    pub recorded_post_body: Mutex<Option<String>>,
    pub recorded_comment_body: Mutex<Option<String>>,
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>> {
        Ok(self.user_by_email.clone())
    }
    async fn get_user(&self, _id: i64) -> Result<Option<User>> {
        Ok(self.user_by_id.clone())
    }
    async fn create_user(&self, _name: &str, _email: &str, _password_hash: &str) -> Result<User> {
        Ok(self.created_user.clone().unwrap_or_default())
    }
    async fn list_posts(&self, _search: Option<String>) -> Result<Vec<BlogPost>> {
        Ok(self.posts_to_return.clone())
    }
    async fn get_post(&self, _id: i64) -> Result<Option<BlogPost>> {
        Ok(self.post_to_return.clone())
    }
    async fn create_post(&self, req: CreatePostRequest, _author_id: i64) -> Result<BlogPost> {
        *self.recorded_post_body.lock().unwrap() = Some(req.body.clone());
        Ok(BlogPost {
            body: req.body,
            ..BlogPost::default()
        })
    }
    async fn update_post(&self, _id: i64, req: UpdatePostRequest) -> Result<Option<BlogPost>> {
        if let Some(body) = req.body {
            *self.recorded_post_body.lock().unwrap() = Some(body);
        }
        Ok(self.post_to_return.clone())
    }
    async fn delete_post(&self, _id: i64) -> Result<bool> {
        Ok(self.delete_post_result)
    }
    async fn add_comment(&self, post_id: i64, user_id: i64, body: String) -> Result<Option<Comment>> {
        *self.recorded_comment_body.lock().unwrap() = Some(body.clone());
        if self.add_comment_succeeds {
            Ok(Some(Comment {
                id: 1,
                post_id,
                user_id,
                body,
                ..Comment::default()
            }))
        } else {
            Ok(None)
        }
    }
    async fn get_comments(&self, _post_id: i64) -> Result<Vec<Comment>> {
        Ok(self.comments_to_return.clone())
    }
}

// --- TEST UTILITIES ---

fn test_user(id: i64, role: Role) -> User {
    User {
        id,
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        password_hash: String::new(),
        role,
    }
}

// Creates an AppState sharing the mock components with the test body.
fn create_test_state(repo: Arc<MockRepoControl>, mailer: Arc<MockMailer>) -> AppState {
    AppState {
        repo,
        mailer,
        config: AppConfig::default(),
    }
}

fn admin_user() -> AdminUser {
    AdminUser { id: 1 }
}

fn reader_auth() -> AuthUser {
    AuthUser {
        id: 2,
        role: Role::Reader,
    }
}

// --- AUTH HANDLER TESTS ---

#[tokio::test]
async fn test_register_success_sets_session_cookie() {
    let repo = Arc::new(MockRepoControl {
        created_user: Some(test_user(1, Role::Admin)),
        ..MockRepoControl::default()
    });
    let state = create_test_state(repo, Arc::new(MockMailer::new()));

    let payload = RegisterRequest {
        name: "First".to_string(),
        email: "first@example.com".to_string(),
        password: "hunter2hunter2".to_string(),
    };

    let response = handlers::register(State(state), Json(payload)).await.unwrap();
    let (parts, _body) = response.into_parts();

    assert_eq!(parts.status, StatusCode::CREATED);
    let cookie = parts
        .headers
        .get(header::SET_COOKIE)
        .expect("register must set a session cookie")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("blog_session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let repo = Arc::new(MockRepoControl {
        user_by_email: Some(test_user(1, Role::Admin)),
        ..MockRepoControl::default()
    });
    let state = create_test_state(repo, Arc::new(MockMailer::new()));

    let payload = RegisterRequest {
        name: "Again".to_string(),
        email: "first@example.com".to_string(),
        password: "hunter2hunter2".to_string(),
    };

    let err = handlers::register(State(state), Json(payload))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateEmail));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_missing_fields() {
    let state = create_test_state(
        Arc::new(MockRepoControl::default()),
        Arc::new(MockMailer::new()),
    );

    let payload = RegisterRequest {
        name: "  ".to_string(),
        email: "a@b.com".to_string(),
        password: "pw".to_string(),
    };

    let err = handlers::register(State(state), Json(payload))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failure_is_uniform_for_unknown_email_and_wrong_password() {
    // Unknown email.
    let state_unknown = create_test_state(
        Arc::new(MockRepoControl::default()),
        Arc::new(MockMailer::new()),
    );
    let err_unknown = handlers::login(
        State(state_unknown),
        Json(LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "whatever".to_string(),
        }),
    )
    .await
    .unwrap_err();

    // Known email, wrong password.
    let stored = User {
        password_hash: password::hash_password("correct-password").unwrap(),
        ..test_user(1, Role::Reader)
    };
    let state_wrong = create_test_state(
        Arc::new(MockRepoControl {
            user_by_email: Some(stored),
            ..MockRepoControl::default()
        }),
        Arc::new(MockMailer::new()),
    );
    let err_wrong = handlers::login(
        State(state_wrong),
        Json(LoginRequest {
            email: "test@example.com".to_string(),
            password: "wrong-password".to_string(),
        }),
    )
    .await
    .unwrap_err();

    // The two failures must be indistinguishable to the caller.
    assert_eq!(err_unknown.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(err_unknown.status_code(), err_wrong.status_code());
    assert_eq!(err_unknown.user_message(), err_wrong.user_message());
}

#[tokio::test]
async fn test_login_success_sets_session_cookie() {
    let stored = User {
        password_hash: password::hash_password("correct-password").unwrap(),
        ..test_user(1, Role::Reader)
    };
    let state = create_test_state(
        Arc::new(MockRepoControl {
            user_by_email: Some(stored),
            ..MockRepoControl::default()
        }),
        Arc::new(MockMailer::new()),
    );

    let response = handlers::login(
        State(state),
        Json(LoginRequest {
            email: "test@example.com".to_string(),
            password: "correct-password".to_string(),
        }),
    )
    .await
    .unwrap();

    let (parts, _body) = response.into_parts();
    assert_eq!(parts.status, StatusCode::OK);
    assert!(parts.headers.contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn test_logout_expires_cookie_without_a_session() {
    let response = handlers::logout().await;
    let (parts, _body) = response.into_parts();

    assert_eq!(parts.status, StatusCode::OK);
    let cookie = parts
        .headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

// --- READ HANDLER TESTS ---

#[tokio::test]
async fn test_get_post_details_success() {
    let mock_post = BlogPost {
        id: 5,
        title: "A title".to_string(),
        ..BlogPost::default()
    };
    let state = create_test_state(
        Arc::new(MockRepoControl {
            post_to_return: Some(mock_post.clone()),
            ..MockRepoControl::default()
        }),
        Arc::new(MockMailer::new()),
    );

    let result = handlers::get_post_details(State(state), Path(5)).await;

    let Json(post) = result.unwrap();
    assert_eq!(post.id, mock_post.id);
    assert_eq!(post.title, mock_post.title);
}

#[tokio::test]
async fn test_get_post_details_not_found() {
    let state = create_test_state(
        Arc::new(MockRepoControl::default()),
        Arc::new(MockMailer::new()),
    );

    let err = handlers::get_post_details(State(state), Path(5))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_posts_returns_list() {
    let state = create_test_state(
        Arc::new(MockRepoControl {
            posts_to_return: vec![BlogPost::default(), BlogPost::default()],
            ..MockRepoControl::default()
        }),
        Arc::new(MockMailer::new()),
    );

    let Json(posts) = handlers::get_posts(
        State(state),
        Query(handlers::PostFilter { search: None }),
    )
    .await
    .unwrap();
    assert_eq!(posts.len(), 2);
}

// --- SANITIZATION-AT-WRITE TESTS ---

#[tokio::test]
async fn test_create_post_sanitizes_body_before_persistence() {
    let repo = Arc::new(MockRepoControl::default());
    let state = create_test_state(repo.clone(), Arc::new(MockMailer::new()));

    let payload = CreatePostRequest {
        title: "Title".to_string(),
        subtitle: "Sub".to_string(),
        body: "<script>alert(1)</script><b>hi</b>".to_string(),
        img_url: None,
    };

    let (status, Json(post)) = handlers::create_post(admin_user(), State(state), Json(payload))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let recorded = repo.recorded_post_body.lock().unwrap().clone().unwrap();
    assert_eq!(recorded, "<b>hi</b>");
    assert_eq!(post.body, "<b>hi</b>");
}

#[tokio::test]
async fn test_update_post_sanitizes_replacement_body() {
    let repo = Arc::new(MockRepoControl {
        post_to_return: Some(BlogPost::default()),
        ..MockRepoControl::default()
    });
    let state = create_test_state(repo.clone(), Arc::new(MockMailer::new()));

    let payload = UpdatePostRequest {
        body: Some(r#"<a href="javascript:evil()">link</a>"#.to_string()),
        ..UpdatePostRequest::default()
    };

    handlers::update_post(admin_user(), State(state), Path(1), Json(payload))
        .await
        .unwrap();

    let recorded = repo.recorded_post_body.lock().unwrap().clone().unwrap();
    assert!(!recorded.contains("javascript"));
    assert!(recorded.contains("link"));
}

#[tokio::test]
async fn test_add_comment_sanitizes_body_before_persistence() {
    let repo = Arc::new(MockRepoControl {
        add_comment_succeeds: true,
        ..MockRepoControl::default()
    });
    let state = create_test_state(repo.clone(), Arc::new(MockMailer::new()));

    let payload = CreateCommentRequest {
        body: "<img src=x onerror=alert(1)><em>nice post</em>".to_string(),
    };

    let (status, Json(comment)) =
        handlers::add_comment(reader_auth(), State(state), Path(1), Json(payload))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let recorded = repo.recorded_comment_body.lock().unwrap().clone().unwrap();
    assert!(!recorded.contains("onerror"));
    assert!(recorded.contains("<em>nice post</em>"));
    assert_eq!(comment.body, recorded);
}

#[tokio::test]
async fn test_add_comment_missing_post_not_found() {
    let state = create_test_state(
        Arc::new(MockRepoControl {
            add_comment_succeeds: false,
            ..MockRepoControl::default()
        }),
        Arc::new(MockMailer::new()),
    );

    let err = handlers::add_comment(
        reader_auth(),
        State(state),
        Path(99),
        Json(CreateCommentRequest {
            body: "hello".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

// --- ADMIN MUTATION TESTS ---

#[tokio::test]
async fn test_delete_post_success() {
    let state = create_test_state(
        Arc::new(MockRepoControl {
            delete_post_result: true,
            ..MockRepoControl::default()
        }),
        Arc::new(MockMailer::new()),
    );

    let status = handlers::delete_post(admin_user(), State(state), Path(1))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_post_not_found() {
    let state = create_test_state(
        Arc::new(MockRepoControl::default()),
        Arc::new(MockMailer::new()),
    );

    let err = handlers::delete_post(admin_user(), State(state), Path(1))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

// --- CONTACT HANDLER TESTS ---

fn contact_payload() -> ContactRequest {
    ContactRequest {
        name: "Visitor".to_string(),
        email: "visitor@example.com".to_string(),
        phone: None,
        message: "I enjoy the blog".to_string(),
    }
}

#[tokio::test]
async fn test_contact_relays_message() {
    let mailer = Arc::new(MockMailer::new());
    let state = create_test_state(Arc::new(MockRepoControl::default()), mailer.clone());

    let Json(body) = handlers::contact(State(state), Json(contact_payload()))
        .await
        .unwrap();

    assert_eq!(body.message, "Your message has been sent successfully!");
    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "visitor@example.com");
}

#[tokio::test]
async fn test_contact_still_reports_success_when_transport_fails() {
    // Deliberate behavior: a failed relay is logged server-side while the
    // visitor is told the message went through. There is no retry and no
    // delivery guarantee.
    let mailer = Arc::new(MockMailer::new_failing());
    let state = create_test_state(Arc::new(MockRepoControl::default()), mailer.clone());

    let result = handlers::contact(State(state), Json(contact_payload())).await;

    let Json(body) = result.unwrap();
    assert_eq!(body.message, "Your message has been sent successfully!");
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_contact_rejects_missing_required_fields() {
    let state = create_test_state(
        Arc::new(MockRepoControl::default()),
        Arc::new(MockMailer::new()),
    );

    let payload = ContactRequest {
        message: "  ".to_string(),
        ..contact_payload()
    };

    let err = handlers::contact(State(state), Json(payload))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}
