//! Drives `ApiClient` against a small stand-in for the vidshare API bound to
//! an ephemeral port. The stand-in issues numbered access tokens and lets a
//! test expire the current one or make refresh fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Multipart, Query, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use futures::future::join_all;
use reqwest::Method;
use serde_json::{json, Value};
use vidshare_client::{ApiClient, ClientError, Credentials, Registration, Upload, VideoQuery};

const PASSWORD: &str = "hunter22";
const REFRESH_COOKIE: &str = "refreshToken=rt-secret";

#[derive(Clone, Default)]
struct Mock {
    /// Number of the access token currently accepted.
    token: Arc<AtomicUsize>,
    refresh_calls: Arc<AtomicUsize>,
    refresh_disabled: Arc<AtomicBool>,
    always_401_hits: Arc<AtomicUsize>,
    /// `(authorized, avatar bytes)` per avatar upload attempt.
    avatar_uploads: Arc<Mutex<Vec<(bool, Vec<u8>)>>>,
    seen_auth: Arc<Mutex<Vec<String>>>,
}

impl Mock {
    fn current(&self) -> String {
        format!("access-{}", self.token.load(Ordering::SeqCst))
    }

    /// Invalidate the access token the client holds.
    fn expire(&self) {
        self.token.fetch_add(1, Ordering::SeqCst);
    }

    fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.current());
        headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(expected.as_str())
    }
}

fn envelope(status: StatusCode, data: Value, message: &str) -> Response {
    let body = json!({
        "statusCode": status.as_u16(),
        "data": data,
        "message": message,
        "success": status.is_success(),
    });
    (status, Json(body)).into_response()
}

fn unauthorized() -> Response {
    let body = json!({
        "statusCode": 401,
        "data": null,
        "message": "Invalid or expired access token",
        "success": false,
        "code": "UNAUTHORIZED",
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

fn user(username: &str) -> Value {
    json!({
        "id": 1,
        "username": username,
        "email": format!("{username}@example.com"),
        "fullName": "Test User",
        "avatar": "https://media.test/avatar.png",
        "coverImage": null,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z",
    })
}

async fn login(State(mock): State<Mock>, Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return unauthorized();
    }
    mock.expire();
    let access = mock.current();
    let data = json!({
        "user": user(body["username"].as_str().unwrap_or("anon")),
        "accessToken": access,
        "refreshToken": "rt-secret",
    });
    (
        AppendHeaders([(SET_COOKIE, format!("{REFRESH_COOKIE}; HttpOnly; Path=/"))]),
        envelope(StatusCode::OK, data, "User logged in successfully"),
    )
        .into_response()
}

async fn refresh(State(mock): State<Mock>, headers: HeaderMap) -> Response {
    mock.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Give concurrent callers time to pile up behind the gate.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let has_cookie = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains(REFRESH_COOKIE));
    if !has_cookie || mock.refresh_disabled.load(Ordering::SeqCst) {
        return unauthorized();
    }

    mock.expire();
    let data = json!({ "accessToken": mock.current(), "refreshToken": "rt-secret" });
    envelope(StatusCode::OK, data, "Access token refreshed")
}

async fn current_user(State(mock): State<Mock>, headers: HeaderMap) -> Response {
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        mock.seen_auth.lock().unwrap().push(auth.to_string());
    }
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    envelope(StatusCode::OK, user("alice"), "Current user fetched successfully")
}

async fn always_401(State(mock): State<Mock>) -> Response {
    mock.always_401_hits.fetch_add(1, Ordering::SeqCst);
    unauthorized()
}

async fn logout(State(mock): State<Mock>, headers: HeaderMap) -> Response {
    if !mock.authorized(&headers) {
        return unauthorized();
    }
    (
        AppendHeaders([(SET_COOKIE, "refreshToken=; Max-Age=0; Path=/".to_string())]),
        envelope(StatusCode::OK, json!({}), "User logged out"),
    )
        .into_response()
}

async fn videos(Query(query): Query<HashMap<String, String>>) -> Response {
    let page: i64 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: i64 = query.get("limit").and_then(|p| p.parse().ok()).unwrap_or(10);
    let title = query.get("query").cloned().unwrap_or_default();
    let data = json!({
        "docs": [{
            "id": 7,
            "videoFile": "https://media.test/v.mp4",
            "thumbnail": "https://media.test/t.png",
            "title": title,
            "description": "d",
            "duration": 3.5,
            "views": 0,
            "isPublished": true,
            "createdAt": "2024-01-01T00:00:00Z",
            "owner": { "id": 1, "username": "alice", "fullName": "Alice", "avatar": "a" },
        }],
        "pagination": {
            "page": page,
            "limit": limit,
            "totalDocs": 1,
            "totalPages": 1,
            "hasNextPage": false,
            "hasPrevPage": page > 1,
        },
    });
    envelope(StatusCode::OK, data, "Videos fetched successfully")
}

async fn register(mut multipart: Multipart) -> Response {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap();
        let value = match file_name {
            Some(file) => format!("{file}:{}", bytes.len()),
            None => String::from_utf8_lossy(&bytes).into_owned(),
        };
        fields.insert(name, value);
    }
    if !fields.contains_key("avatar") {
        return envelope(StatusCode::BAD_REQUEST, Value::Null, "avatar file is required");
    }
    let mut data = user(&fields["username"]);
    data["fullName"] = json!(fields["fullName"]);
    data["avatar"] = json!(fields["avatar"]);
    data["coverImage"] = json!(fields.get("coverImage"));
    envelope(StatusCode::CREATED, data, "User registered successfully")
}

async fn update_avatar(
    State(mock): State<Mock>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut avatar = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("avatar") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            avatar = Some((file_name, field.bytes().await.unwrap().to_vec()));
        }
    }
    let authorized = mock.authorized(&headers);
    let (file_name, bytes) = avatar.unwrap_or_default();
    mock.avatar_uploads
        .lock()
        .unwrap()
        .push((authorized, bytes.clone()));
    if !authorized {
        return unauthorized();
    }
    let mut data = user("alice");
    data["avatar"] = json!(format!("{file_name}:{}", bytes.len()));
    envelope(StatusCode::OK, data, "Avatar image updated successfully")
}

async fn spawn_api() -> (ApiClient, Mock) {
    let mock = Mock::default();
    let api = Router::new()
        .route("/users/login", post(login))
        .route("/users/refresh-token", post(refresh))
        .route("/users/current-user", get(current_user))
        .route("/users/logout", post(logout))
        .route("/users/register", post(register))
        .route("/users/avatar", patch(update_avatar))
        .route("/always-401", get(always_401))
        .route("/video", get(videos))
        .with_state(mock.clone());
    let app = Router::new().nest("/api/v1", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = ApiClient::new(&format!("http://{addr}/api/v1/")).unwrap();
    (client, mock)
}

async fn signed_in() -> (ApiClient, Mock) {
    let (client, mock) = spawn_api().await;
    client
        .login(&Credentials::username("alice", PASSWORD))
        .await
        .unwrap();
    (client, mock)
}

#[tokio::test]
async fn login_stores_the_access_token() {
    let (client, mock) = signed_in().await;

    assert_eq!(client.base_url().rsplit('/').next(), Some("v1"));
    assert_eq!(client.session().access_token().await, Some(mock.current()));

    let me = client.current_user().await.unwrap();
    assert_eq!(me.username, "alice");
    assert_eq!(mock.refreshes(), 0);
}

#[tokio::test]
async fn expired_token_is_refreshed_and_the_request_replayed() {
    let (client, mock) = signed_in().await;
    mock.expire();

    let me = client.current_user().await.unwrap();
    assert_eq!(me.username, "alice");
    assert_eq!(mock.refreshes(), 1);
    assert_eq!(client.session().access_token().await, Some(mock.current()));

    let seen = mock.seen_auth.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0], seen[1]);
    assert_eq!(seen[1], format!("Bearer {}", mock.current()));
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let (client, mock) = signed_in().await;
    mock.expire();

    let calls = (0..8).map(|_| {
        let client = client.clone();
        async move { client.current_user().await }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok), "{results:?}");
    assert_eq!(mock.refreshes(), 1);
}

#[tokio::test]
async fn failed_refresh_clears_the_session_for_every_waiter() {
    let (client, mock) = signed_in().await;
    mock.expire();
    mock.refresh_disabled.store(true, Ordering::SeqCst);

    let calls = (0..4).map(|_| {
        let client = client.clone();
        async move { client.current_user().await }
    });
    let results = join_all(calls).await;

    for result in &results {
        let err = result.as_ref().unwrap_err();
        assert!(
            err.is_unauthorized() || matches!(err, ClientError::SessionExpired),
            "{err:?}"
        );
    }
    assert_eq!(mock.refreshes(), 1);
    assert!(!client.session().is_signed_in().await);
}

#[tokio::test]
async fn a_second_401_is_returned_instead_of_looping() {
    let (client, mock) = signed_in().await;

    let err = client.get_json::<Value>("/always-401").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(mock.always_401_hits.load(Ordering::SeqCst), 2);
    assert_eq!(mock.refreshes(), 1);
    // The refresh itself worked, so the session survives.
    assert!(client.session().is_signed_in().await);
}

#[tokio::test]
async fn bad_credentials_do_not_trigger_a_refresh() {
    let (client, mock) = spawn_api().await;

    let err = client
        .login(&Credentials::username("alice", "wrong"))
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Api { status: 401, .. });
    assert_eq!(mock.refreshes(), 0);
    assert!(!client.session().is_signed_in().await);
}

#[tokio::test]
async fn anonymous_401_without_refresh_cookie_fails_cleanly() {
    let (client, mock) = spawn_api().await;

    let err = client.current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(mock.refreshes(), 1);
}

#[tokio::test]
async fn explicit_authorization_header_is_left_alone() {
    let (client, mock) = signed_in().await;

    let request = client
        .request(Method::GET, "/users/current-user")
        .header("Authorization", "Bearer caller-supplied")
        .build()
        .unwrap();
    let response = client.execute(request).await.unwrap();

    // The caller's token is rejected, refreshed over and replayed.
    assert_eq!(response.status(), 200);
    let seen = mock.seen_auth.lock().unwrap().clone();
    assert_eq!(seen[0], "Bearer caller-supplied");
}

#[tokio::test]
async fn explicit_refresh_rotates_the_session_token() {
    let (client, mock) = signed_in().await;
    let before = client.session().access_token().await;

    let pair = client.refresh().await.unwrap();
    assert_eq!(Some(pair.access_token.clone()), client.session().access_token().await);
    assert_ne!(Some(pair.access_token), before);
    assert_eq!(mock.refreshes(), 1);
}

#[tokio::test]
async fn logout_clears_the_session_and_refresh_cookie() {
    let (client, mock) = signed_in().await;

    client.logout().await.unwrap();
    assert!(!client.session().is_signed_in().await);

    // The expired cookie is gone, so a refresh has nothing to present.
    let err = client.refresh().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(mock.refreshes(), 1);
}

#[tokio::test]
async fn list_videos_sends_the_query() {
    let (client, _mock) = spawn_api().await;

    let page = client
        .list_videos(&VideoQuery {
            page: Some(2),
            limit: Some(5),
            query: Some("rust".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.pagination.page, 2);
    assert_eq!(page.pagination.limit, 5);
    assert!(page.pagination.has_prev_page);
    assert_eq!(page.docs[0].title, "rust");
    assert_eq!(page.docs[0].owner.username, "alice");
}

#[tokio::test]
async fn register_sends_a_multipart_form() {
    let (client, _mock) = spawn_api().await;

    let user = client
        .register(Registration {
            full_name: "Bob Builder".into(),
            email: "bob@example.com".into(),
            username: "bob".into(),
            password: PASSWORD.into(),
            avatar: Upload {
                file_name: "me.png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            },
            cover_image: None,
        })
        .await
        .unwrap();

    assert_eq!(user.username, "bob");
    assert_eq!(user.full_name, "Bob Builder");
    assert_eq!(user.avatar, "me.png:3");
    assert_eq!(user.cover_image, None);
}

#[tokio::test]
async fn send_json_surfaces_api_errors() {
    let (client, _mock) = spawn_api().await;

    let err = client
        .send_json::<_, Value>(Method::POST, "/users/login", &json!({ "password": "nope" }))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ClientError::Api { status: 401, code: Some(ref code), .. } if code == "UNAUTHORIZED"
    );
}

#[tokio::test]
async fn multipart_upload_is_replayed_after_refresh() {
    let (client, mock) = signed_in().await;
    mock.expire();

    let bytes: Vec<u8> = (0..=255).cycle().take(4096).collect();
    let user = client
        .update_avatar(Upload {
            file_name: "new.png".into(),
            content_type: "image/png".into(),
            bytes: bytes.clone(),
        })
        .await
        .unwrap();

    assert_eq!(user.avatar, "new.png:4096");
    assert_eq!(mock.refreshes(), 1);

    let uploads = mock.avatar_uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 2);
    assert!(!uploads[0].0);
    assert!(uploads[1].0);
    assert_eq!(uploads[0].1, bytes);
    assert_eq!(uploads[1].1, bytes);
}
