//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use playlister_core::{Backend, DatabaseManager};
use playlister_server::{
    create_router,
    services::{auth::MIN_BCRYPT_COST, AuthService},
    state::AppState,
};
use playlister_storage::{open_database, DatabaseConfig};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key";

/// Test user credentials
pub mod fixtures {
    pub const TEST_USER_NAME: &str = "Ada";
    pub const TEST_EMAIL: &str = "a@x.com";
    pub const TEST_PASSWORD: &str = "pw12345678";

    pub const OTHER_EMAIL: &str = "b@x.com";
}

/// Router over a fresh store in a temp directory
pub struct TestApp {
    pub router: Router,
    pub db: Arc<dyn DatabaseManager>,
    pub auth_service: Arc<AuthService>,
    _temp_dir: TempDir,
}

/// Response status plus the parsed JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub session_cookie: Option<String>,
}

impl TestApp {
    pub async fn new(backend: Backend) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            backend,
            database_url: format!("sqlite://{}", temp_dir.path().join("test.db").display()),
            document_path: temp_dir.path().join("test.redb"),
        };
        let db = open_database(&config).await.unwrap();

        // Cheapest bcrypt cost, plain-HTTP cookies
        let auth_service = Arc::new(AuthService::new(
            TEST_SECRET.to_string(),
            1,
            false,
            MIN_BCRYPT_COST,
        ));

        let app_state = AppState::new(Arc::clone(&db), Arc::clone(&auth_service));
        let router = create_router(app_state, &["http://localhost:3000".to_string()]);

        Self {
            router,
            db,
            auth_service,
            _temp_dir: temp_dir,
        }
    }

    /// Send a request, optionally with a JSON body and a session cookie
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let body = body.map(|json| ("application/json", json.to_string()));
        self.request_raw(method, uri, body, cookie).await
    }

    /// Send a request with an arbitrary `(content-type, body)` pair
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Option<(&str, String)>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some((content_type, raw)) => builder
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(raw))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let session_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("token="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON response body: {}", String::from_utf8_lossy(&bytes))
            })
        };

        TestResponse {
            status,
            body,
            session_cookie,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), cookie).await
    }

    pub async fn put(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::PUT, uri, Some(body), cookie).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, None, cookie).await
    }

    /// Register an account and log in, returning the `token=...` cookie
    pub async fn register_and_login(&self, user_name: &str, email: &str, password: &str) -> String {
        let registered = self
            .post(
                "/auth/register",
                serde_json::json!({
                    "userName": user_name,
                    "email": email,
                    "password": password,
                    "passwordVerify": password,
                }),
                None,
            )
            .await;
        assert_eq!(registered.status, StatusCode::OK, "{}", registered.body);

        let logged_in = self
            .post(
                "/auth/login",
                serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(logged_in.status, StatusCode::OK, "{}", logged_in.body);
        logged_in.session_cookie.expect("login sets a session cookie")
    }
}
