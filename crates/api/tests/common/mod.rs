#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use vidshare_api::auth::jwt::JwtConfig;
use vidshare_api::config::ServerConfig;
use vidshare_api::router::build_app_router;
use vidshare_api::state::AppState;
use vidshare_media::MemoryMediaHost;

pub const PASSWORD: &str = "correct-horse-battery";

/// Test configuration: permissive CORS origin, plain-HTTP cookies and a
/// small upload limit so size checks are cheap to hit.
pub fn test_config(upload_tmp_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: String::new(),
        db_max_connections: 5,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 64 * 1024,
        upload_tmp_dir: upload_tmp_dir.to_path_buf(),
        cookie_secure: false,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 10,
        },
    }
}

/// The production router over an in-memory media host and a private
/// staging directory.
pub struct TestApp {
    pub router: Router,
    pub media: Arc<MemoryMediaHost>,
    pub staging: TempDir,
}

impl TestApp {
    pub fn new(pool: PgPool) -> Self {
        let staging = tempfile::tempdir().unwrap();
        let config = test_config(staging.path());
        let media = Arc::new(MemoryMediaHost::new());
        let state = AppState::new(pool, config.clone(), media.clone());
        Self {
            router: build_app_router(state, &config),
            media,
            staging,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Number of files left behind in the staging directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging.path()).unwrap().count()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(request(Method::GET, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(request(Method::DELETE, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Value,
        token: Option<&str>,
    ) -> Response<Body> {
        self.send(
            request(method, uri, token)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> Response<Body> {
        self.json(Method::POST, uri, body, token).await
    }

    pub async fn patch_json(&self, uri: &str, body: Value, token: Option<&str>) -> Response<Body> {
        self.json(Method::PATCH, uri, body, token).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        form: MultipartBody,
        token: Option<&str>,
    ) -> Response<Body> {
        let (content_type, body) = form.finish();
        self.send(
            request(method, uri, token)
                .header(CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Register `username` with an avatar and return the created user.
    pub async fn register(&self, username: &str) -> Value {
        let form = MultipartBody::new()
            .text("fullName", &format!("{username} tester"))
            .text("email", &format!("{username}@example.com"))
            .text("username", username)
            .text("password", PASSWORD)
            .file("avatar", "avatar.png", b"fake png bytes");
        let response = self
            .multipart(Method::POST, "/api/v1/users/register", form, None)
            .await;
        assert_eq!(response.status(), 201, "registering {username}");
        body_json(response).await["data"].clone()
    }

    /// Log `username` in and return the full login envelope's `data`.
    pub async fn login(&self, username: &str) -> Value {
        let response = self
            .post_json(
                "/api/v1/users/login",
                serde_json::json!({ "username": username, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(response.status(), 200, "logging in {username}");
        body_json(response).await["data"].clone()
    }

    /// Register and log in, returning `(user_id, access_token)`.
    pub async fn signup(&self, username: &str) -> (i64, String) {
        let user = self.register(username).await;
        let login = self.login(username).await;
        (
            user["id"].as_i64().unwrap(),
            login["accessToken"].as_str().unwrap().to_string(),
        )
    }

    /// Upload a video as the owner of `token` and return its id.
    pub async fn upload_video(&self, token: &str, title: &str, published: bool) -> i64 {
        let form = MultipartBody::new()
            .text("title", title)
            .text("description", "a test video")
            .text("isPublished", if published { "true" } else { "false" })
            .file("videoFile", "clip.mp4", b"fake mp4 bytes")
            .file("thumbnail", "thumb.jpg", b"fake jpg bytes");
        let response = self
            .multipart(Method::POST, "/api/v1/video", form, Some(token))
            .await;
        assert_eq!(response.status(), 201, "uploading {title}");
        body_json(response).await["data"]["id"].as_i64().unwrap()
    }
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// A request carrying only a cookie header.
pub fn with_cookie(method: Method, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// Minimal `multipart/form-data` encoder.
#[derive(Default)]
pub struct MultipartBody {
    parts: Vec<u8>,
}

const BOUNDARY: &str = "----vidshare-test-boundary";

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.parts.extend_from_slice(bytes);
        self.parts.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.parts
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), self.parts)
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` header values of a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The value of cookie `name` set by a response.
pub fn cookie_from(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|c| {
        let pair = c.split(';').next()?;
        let (k, v) = pair.split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}
