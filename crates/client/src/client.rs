//! [`ApiClient`]: bearer attachment, 401 refresh-and-retry, typed helpers.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use http_body_util::BodyExt;
use reqwest::{Body, Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::ClientError;
use crate::session::Session;
use crate::types::{
    Credentials, Envelope, LoginResponse, Page, Registration, TokenPair, Upload, User, VideoQuery,
    VideoSummary,
};

const LOGIN_PATH: &str = "/users/login";
const REFRESH_PATH: &str = "/users/refresh-token";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for one vidshare API base url (e.g. `http://host/api/v1`).
///
/// Cloning is cheap; clones share the connection pool, cookie store,
/// [`Session`] and refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    session: Arc<Session>,
    /// Held for the duration of a refresh call so that only one is ever in
    /// flight.
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').into(),
            session: Arc::new(Session::new()),
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start a request to `path` (relative to the base url, leading `/`).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send `request` through the token interceptor.
    ///
    /// - Without an explicit `Authorization` header, the session's token is
    ///   attached as `Bearer`.
    /// - A 401 triggers one shared refresh and a single resubmission with
    ///   the new token. Whatever the resubmission returns, a second 401
    ///   included, goes back to the caller.
    /// - Streamed bodies (multipart uploads) are buffered before sending so
    ///   the resubmission carries the same bytes.
    /// - The login and refresh endpoints are never retried.
    pub async fn execute(&self, mut request: Request) -> Result<Response, ClientError> {
        let (token, generation) = self.session.snapshot().await;
        if !request.headers().contains_key(AUTHORIZATION) {
            if let Some(token) = &token {
                request.headers_mut().insert(AUTHORIZATION, bearer(token)?);
            }
        }

        let retry = if is_auth_endpoint(&request) {
            None
        } else {
            replayable(&mut request).await?
        };

        let response = self.http.execute(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let Some(mut retry) = retry else {
            return Ok(response);
        };

        tracing::debug!(url = %retry.url(), "Access token rejected, refreshing");
        let token = self.refresh_after(generation).await?;
        retry.headers_mut().insert(AUTHORIZATION, bearer(&token)?);

        Ok(self.http.execute(retry).await?)
    }

    /// Refresh the access token now, outside of any failed request.
    pub async fn refresh(&self) -> Result<TokenPair, ClientError> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Single-flight refresh for a request sent under `seen_generation`.
    ///
    /// If the session changed while this caller waited for the gate, the
    /// refresh already happened (or failed and cleared the session) and its
    /// outcome is reused.
    async fn refresh_after(&self, seen_generation: u64) -> Result<String, ClientError> {
        let _gate = self.refresh_gate.lock().await;

        let (token, generation) = self.session.snapshot().await;
        if generation != seen_generation {
            return token.ok_or(ClientError::SessionExpired);
        }

        self.refresh_locked().await.map(|pair| pair.access_token)
    }

    /// Callers must hold `refresh_gate`.
    async fn refresh_locked(&self) -> Result<TokenPair, ClientError> {
        match self.request_refresh().await {
            Ok(pair) => {
                self.session.set_access_token(pair.access_token.clone()).await;
                tracing::debug!("Access token refreshed");
                Ok(pair)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed, clearing session");
                self.session.clear().await;
                Err(err)
            }
        }
    }

    /// Calls the refresh endpoint directly, bypassing the interceptor. The
    /// refresh token travels as a cookie.
    async fn request_refresh(&self) -> Result<TokenPair, ClientError> {
        let response = self.request(Method::POST, REFRESH_PATH).send().await?;
        decode(response).await
    }

    /// GET `path` and unwrap the envelope's `data`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let request = self.request(Method::GET, path).build()?;
        decode(self.execute(request).await?).await
    }

    /// Send `body` as JSON and unwrap the envelope's `data`.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, path).json(body).build()?;
        decode(self.execute(request).await?).await
    }

    pub async fn register(&self, registration: Registration) -> Result<User, ClientError> {
        let mut form = Form::new()
            .text("fullName", registration.full_name)
            .text("email", registration.email)
            .text("username", registration.username)
            .text("password", registration.password)
            .part("avatar", file_part(registration.avatar)?);
        if let Some(cover) = registration.cover_image {
            form = form.part("coverImage", file_part(cover)?);
        }

        let request = self
            .request(Method::POST, "/users/register")
            .multipart(form)
            .build()?;
        decode(self.execute(request).await?).await
    }

    /// Replace the signed-in user's avatar.
    pub async fn update_avatar(&self, avatar: Upload) -> Result<User, ClientError> {
        let form = Form::new().part("avatar", file_part(avatar)?);
        let request = self
            .request(Method::PATCH, "/users/avatar")
            .multipart(form)
            .build()?;
        decode(self.execute(request).await?).await
    }

    /// Sign in; the access token is kept in the session and the refresh
    /// token in the cookie store.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        let login: LoginResponse = self.send_json(Method::POST, LOGIN_PATH, credentials).await?;
        self.session.set_access_token(login.access_token.clone()).await;
        tracing::debug!(user_id = login.user.id, "Signed in");
        Ok(login)
    }

    /// Sign out on the server. The local session is cleared even when the
    /// server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .send_json::<_, serde_json::Value>(Method::POST, "/users/logout", &serde_json::json!({}))
            .await;
        self.session.clear().await;
        result.map(|_| ())
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        self.get_json("/users/current-user").await
    }

    pub async fn list_videos(&self, query: &VideoQuery) -> Result<Page<VideoSummary>, ClientError> {
        let request = self.request(Method::GET, "/video").query(query).build()?;
        decode(self.execute(request).await?).await
    }
}

fn bearer(token: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| ClientError::InvalidToken)
}

fn is_auth_endpoint(request: &Request) -> bool {
    let path = request.url().path();
    path.ends_with(LOGIN_PATH) || path.ends_with(REFRESH_PATH)
}

/// Clone `request`, first collecting a streamed body into memory if that is
/// what stands in the way.
async fn replayable(request: &mut Request) -> Result<Option<Request>, ClientError> {
    if let Some(copy) = request.try_clone() {
        return Ok(Some(copy));
    }
    if let Some(body) = request.body_mut().take() {
        let bytes = body.collect().await?.to_bytes();
        *request.body_mut() = Some(Body::from(bytes));
    }
    Ok(request.try_clone())
}

fn file_part(upload: Upload) -> Result<Part, ClientError> {
    Ok(Part::bytes(upload.bytes)
        .file_name(upload.file_name)
        .mime_str(&upload.content_type)?)
}

/// Unwrap a response envelope, turning non-2xx statuses into
/// [`ClientError::Api`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(ClientError::from_body(status.as_u16(), &body));
    }
    let envelope: Envelope<T> = serde_json::from_slice(&body)?;
    Ok(envelope.data)
}
