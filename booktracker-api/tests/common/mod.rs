#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory store and a temporary upload directory per test
/// - Test user creation with ready-made bearer tokens
/// - JSON and multipart request helpers

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use booktracker_api::app::{build_router, AppState};
use booktracker_api::config::Config;
use booktracker_shared::auth::jwt::issue_token;
use booktracker_shared::auth::password::hash_password;
use booktracker_shared::files::FileStore;
use booktracker_shared::models::user::{CreateUser, User};
use booktracker_shared::store::{MemoryStore, Store, UserStore};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::Service as _;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "correct horse battery staple";

const BOUNDARY: &str = "booktracker-test-boundary";

/// A user with a valid token
pub struct TestUser {
    pub user: User,
    pub token: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub uploads: TempDir,
    pub app: Router,
    pub config: Config,
}

impl TestContext {
    /// Creates a context with approval required (the default)
    pub async fn new() -> Self {
        Self::with_env(&[]).await
    }

    /// Creates a context with extra environment overrides
    pub async fn with_env(overrides: &[(&str, &str)]) -> Self {
        Self::with_backend(overrides, |store| store as Arc<dyn Store>).await
    }

    /// Creates a context whose router talks to `backend(memory)`
    ///
    /// Tests use this to wrap the in-memory store with failure injection;
    /// `store` still points at the shared memory store.
    pub async fn with_backend<F>(overrides: &[(&str, &str)], backend: F) -> Self
    where
        F: FnOnce(Arc<MemoryStore>) -> Arc<dyn Store>,
    {
        let uploads = TempDir::new().unwrap();
        let upload_dir = uploads.path().join("books");

        let mut vars: HashMap<String, String> = HashMap::from([
            ("DATABASE_URL".to_string(), "postgresql://unused/test".to_string()),
            ("JWT_SECRET".to_string(), JWT_SECRET.to_string()),
            ("UPLOAD_DIR".to_string(), upload_dir.display().to_string()),
        ]);
        for (key, value) in overrides {
            vars.insert(key.to_string(), value.to_string());
        }
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let files = FileStore::new(&config.uploads.dir).await.unwrap();
        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(backend(store.clone()), files, config.clone()));

        Self {
            store,
            uploads,
            app,
            config,
        }
    }

    /// Inserts a user directly and issues a token for them
    pub async fn create_user(&self, username: &str, is_admin: bool) -> TestUser {
        let user = self
            .store
            .create_user(CreateUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: hash_password(PASSWORD).unwrap(),
                is_admin,
            })
            .await
            .unwrap();
        let token = issue_token(user.id, user.is_admin, JWT_SECRET).unwrap();

        TestUser { user, token }
    }

    /// Sends a raw request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().call(request).await.unwrap()
    }

    /// Sends a JSON request and parses the JSON response (Null for empty bodies)
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, Some(token), None).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.json(Method::DELETE, uri, Some(token), None).await
    }

    /// Uploads a book through the multipart endpoint
    pub async fn upload(
        &self,
        token: &str,
        file_name: &str,
        contents: &[u8],
        title: &str,
    ) -> (StatusCode, Value) {
        let body = multipart_body(
            &[("title", title), ("author", "Test Author"), ("description", "")],
            Some(("book", file_name, contents)),
        );
        self.upload_raw(token, body).await
    }

    pub async fn upload_raw(&self, token: &str, body: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/books/upload")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// Number of files currently in the upload directory
    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(&self.config.uploads.dir).unwrap().count()
    }
}

/// Builds a multipart/form-data body using the shared test boundary
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((field, file_name, contents)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    }
}
