#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every test builds its own [`TestApp`] around the real router, backed by
//! the in-memory blog store, an in-memory session store, and a mailer that
//! records instead of sending. No external services are needed.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tower::ServiceExt;
use tower_sessions::cookie::SameSite;
use uuid::Uuid;

use folio_kernel::build_router;
use folio_kernel::models::{CreateUser, Post, SavePost, Tag, User};
use folio_kernel::services::Mailer;
use folio_kernel::session::create_session_layer;
use folio_kernel::state::AppState;
use folio_kernel::store::{BlogStore, MemoryStore};
use folio_kernel::theme::ThemeEngine;

/// Recipient configured for the contact form.
pub const CONTACT_EMAIL: &str = "owner@example.com";

/// Password used for every test account.
pub const PASSWORD: &str = "correct horse battery";

/// A message captured by [`RecordingMailer`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that keeps messages in memory.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent.lock().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Test application wrapper using the REAL routes and state.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(true)
    }

    /// An app with no mail transport configured.
    pub fn without_mailer() -> Self {
        Self::build(false)
    }

    fn build(with_mailer: bool) -> Self {
        // Tests run from crates/kernel/, templates live at the project root
        let templates = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
        let theme = ThemeEngine::new(&templates).expect("Failed to load templates");

        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let configured: Option<Arc<dyn Mailer>> = if with_mailer {
            Some(mailer.clone())
        } else {
            None
        };

        let state = AppState::from_parts(
            store.clone(),
            theme,
            configured,
            "Folio".to_string(),
            CONTACT_EMAIL.to_string(),
        );

        let router = build_router(state).layer(create_session_layer(
            tower_sessions::MemoryStore::default(),
            SameSite::Lax,
            false,
        ));

        Self {
            router,
            store,
            mailer,
        }
    }

    /// A browser with an empty cookie jar.
    pub fn client(&self) -> TestClient<'_> {
        TestClient {
            app: self,
            cookie: None,
        }
    }

    pub async fn create_user(&self, email: &str, staff: bool) -> User {
        self.store
            .create_user(CreateUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
                is_staff: staff,
            })
            .await
            .expect("Failed to create user")
    }

    pub async fn create_tag(&self, name: &str) -> Tag {
        self.store.create_tag(name).await.expect("Failed to create tag")
    }

    pub async fn create_post(&self, headline: &str, slug: &str, active: bool, tags: &[&Tag]) -> Post {
        self.store
            .create_post(SavePost {
                headline: headline.to_string(),
                sub_headline: None,
                thumbnail: None,
                body: Some(format!("<p>{headline} body</p>")),
                active,
                featured: false,
                slug: slug.to_string(),
                tag_ids: tags.iter().map(|t| t.id).collect(),
            })
            .await
            .expect("Failed to create post")
    }

    pub async fn comment_count(&self, post_id: Uuid) -> u64 {
        self.store.count_comments(post_id).await.unwrap()
    }
}

/// A collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The redirect target, if any.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn is_redirect_to(&self, path: &str) -> bool {
        self.status.is_redirection() && self.location() == Some(path)
    }
}

/// Cookie-carrying client.
pub struct TestClient<'a> {
    app: &'a TestApp,
    cookie: Option<String>,
}

impl TestClient<'_> {
    async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().expect("Invalid cookie header"));
        }

        let response = self
            .app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            // Extract just the cookie name=value, ignoring attributes
            let pair = set_cookie.split(';').next().unwrap_or_default().trim();
            let cleared = pair.ends_with('=') || set_cookie.contains("Max-Age=0");
            self.cookie = if cleared { None } else { Some(pair.to_string()) };
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// POST a urlencoded body as-is (no CSRF token added).
    pub async fn post_raw(&mut self, path: &str, pairs: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.send(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Fetch a fresh CSRF token from a page that always renders a form.
    pub async fn token(&mut self) -> String {
        let page = self.get("/profile/").await;
        extract_csrf_token(&page.body).expect("Should find CSRF token")
    }

    /// POST a form with a valid CSRF token.
    pub async fn submit(&mut self, path: &str, pairs: &[(&str, &str)]) -> TestResponse {
        let token = self.token().await;
        let mut with_token: Vec<(&str, &str)> = vec![("_token", token.as_str())];
        with_token.extend_from_slice(pairs);
        self.post_raw(path, &with_token).await
    }

    pub async fn login(&mut self, email: &str) -> TestResponse {
        let response = self
            .submit("/login/", &[("email", email), ("password", PASSWORD)])
            .await;
        assert!(
            response.status.is_redirection(),
            "Login failed for '{email}' (status {})",
            response.status
        );
        response
    }
}

/// Find the value of the hidden `_token` input.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let pattern = r#"name="_token" value=""#;
    let start = html.find(pattern)? + pattern.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}
