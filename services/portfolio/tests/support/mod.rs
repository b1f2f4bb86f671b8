//! Shared harness for the HTTP integration tests.
//!
//! Builds the full router over an in-memory database, a temporary media
//! directory and a temporary client bundle, and drives it with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, header},
    response::Response,
};
use common::database::{DatabaseConfig, init_pool, init_schema};
use http_body_util::BodyExt;
use portfolio::{AppConfig, AppState, create_router, rate_limiter::RateLimiterConfig};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_USER: &str = "curator";
pub const ADMIN_PASS: &str = "correct horse battery staple";
pub const INDEX_HTML: &str = "<!doctype html><title>portfolio client</title>";

const BOUNDARY: &str = "portfolio-test-boundary";

/// A file part for a multipart upload
pub struct UploadFile<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub upload_dir: TempDir,
    pub client_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let upload_dir = TempDir::new().expect("Failed to create upload dir");
        let client_dir = TempDir::new().expect("Failed to create client dir");
        std::fs::write(client_dir.path().join("index.html"), INDEX_HTML)
            .expect("Failed to write index.html");

        let mut config = AppConfig {
            upload_dir: upload_dir.path().to_path_buf(),
            client_dir: client_dir.path().to_path_buf(),
            admin_user: Some(ADMIN_USER.to_string()),
            admin_pass: Some(ADMIN_PASS.to_string()),
            rate_limit: RateLimiterConfig {
                max_requests: 10_000,
                window_seconds: 900,
            },
            ..AppConfig::default()
        };
        customize(&mut config);

        let pool = init_pool(&DatabaseConfig::in_memory())
            .await
            .expect("Failed to open database");
        init_schema(&pool).await.expect("Failed to create schema");

        let state = AppState::new(config, pool.clone())
            .await
            .expect("Failed to build state");

        Self {
            router: create_router(state),
            pool,
            upload_dir,
            client_dir,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("Router is infallible")
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, path: &str, body: Value, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_empty(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method("POST").uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Log in as the configured admin and return the session cookie
    pub async fn login(&self) -> String {
        let resp = self
            .post_json(
                "/api/admin/login",
                serde_json::json!({"user": ADMIN_USER, "pass": ADMIN_PASS}),
                None,
            )
            .await;
        assert_eq!(resp.status(), 200, "admin login failed");
        session_cookie(&resp).expect("login did not set a session cookie")
    }

    pub async fn upload(
        &self,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        files: &[UploadFile<'_>],
    ) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/admin/add")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = multipart_body(fields, files);
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Public work list as JSON values
    pub async fn works(&self) -> Vec<Value> {
        let resp = self.get("/api/works", None).await;
        assert_eq!(resp.status(), 200);
        body_json(resp)
            .await
            .as_array()
            .cloned()
            .expect("work list is not an array")
    }

    /// Files currently in the media directory
    pub fn stored_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.upload_dir.path())
            .expect("Failed to read upload dir")
            .map(|entry| entry.expect("Failed to read dir entry").path())
            .collect()
    }
}

pub fn multipart_body(fields: &[(&str, &str)], files: &[UploadFile<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    for file in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// `name=value` pair of the session cookie set by a response
pub fn session_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("portfolio.sid="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub async fn body_bytes(resp: Response) -> Vec<u8> {
    resp.into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("Body is not JSON")
}

/// Fake PNG payload of `len` bytes
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.extend((0..len.saturating_sub(8)).map(|i| (i % 251) as u8));
    bytes.truncate(len);
    bytes
}
