//! HTTP-level tests for `/api/v1/video`: upload, listing, visibility,
//! edits and deletion with remote asset cleanup.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, MultipartBody, TestApp};
use serde_json::json;
use sqlx::PgPool;
use vidshare_api::upload::TEXT_FIELD_MAX_BYTES;
use vidshare_media::memory::FAKE_VIDEO_DURATION;
use vidshare_media::{MediaHost, ResourceKind};

async fn video_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM videos")
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn publish_stores_assets_and_duration(pool: PgPool) {
    let app = TestApp::new(pool);
    let (owner_id, token) = app.signup("alice").await;

    let form = MultipartBody::new()
        .text("title", "  My first video ")
        .text("description", "hello")
        .file("videoFile", "clip.mp4", b"video bytes")
        .file("thumbnail", "thumb.jpg", b"thumb bytes");
    let response = app
        .multipart(Method::POST, "/api/v1/video", form, Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let video = &json["data"];
    assert_eq!(video["title"], "My first video");
    assert_eq!(video["ownerId"], owner_id);
    assert_eq!(video["duration"], FAKE_VIDEO_DURATION);
    assert_eq!(video["views"], 0);
    assert_eq!(video["isPublished"], false, "new videos start unpublished");
    assert!(video["videoFile"].as_str().unwrap().starts_with("memory://video/"));
    assert!(video.get("videoFilePublicId").is_none());
    assert_eq!(app.staged_files(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn publish_requires_both_files(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let (_, token) = app.signup("bob").await;
    let uploads_before = app.media.upload_count();

    let form = MultipartBody::new()
        .text("title", "no thumb")
        .text("description", "d")
        .file("videoFile", "clip.mp4", b"video bytes");
    let response = app
        .multipart(Method::POST, "/api/v1/video", form, Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "thumbnail file is required");
    assert_eq!(app.media.upload_count(), uploads_before);
    assert_eq!(video_count(&pool).await, 0);
    assert_eq!(app.staged_files(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn oversized_text_field_is_rejected_before_upload(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let (_, token) = app.signup("verbose").await;
    let uploads_before = app.media.upload_count();

    let description = "x".repeat(TEXT_FIELD_MAX_BYTES + 1);
    let form = MultipartBody::new()
        .file("videoFile", "clip.mp4", b"video bytes")
        .text("title", "too much to say")
        .text("description", &description)
        .file("thumbnail", "thumb.jpg", b"jpg bytes");
    let response = app
        .multipart(Method::POST, "/api/v1/video", form, Some(&token))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
    assert!(json["message"].as_str().unwrap().starts_with("description"));
    assert_eq!(app.media.upload_count(), uploads_before);
    assert_eq!(video_count(&pool).await, 0);
    assert_eq!(app.staged_files(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn publish_requires_authentication(pool: PgPool) {
    let app = TestApp::new(pool);
    let form = MultipartBody::new().text("title", "t");
    let response = app.multipart(Method::POST, "/api/v1/video", form, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn second_page_holds_items_eleven_to_twenty(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, token) = app.signup("carol").await;
    for i in 1..=25 {
        app.upload_video(&token, &format!("video {i:02}"), true).await;
    }

    let response = app.get("/api/v1/video?page=2&limit=10", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let docs = json["data"]["docs"].as_array().unwrap();
    let titles: Vec<&str> = docs.iter().map(|d| d["title"].as_str().unwrap()).collect();

    // Default sort is newest first.
    let expected: Vec<String> = (6..=15).rev().map(|i| format!("video {i:02}")).collect();
    assert_eq!(titles, expected);

    let pagination = &json["data"]["pagination"];
    assert_eq!(pagination["page"], 2);
    assert_eq!(pagination["totalDocs"], 25);
    assert_eq!(pagination["totalPages"], 3);
    assert_eq!(pagination["hasNextPage"], true);
    assert_eq!(pagination["hasPrevPage"], true);
    assert_eq!(docs[0]["owner"]["username"], "carol");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn listing_filters_by_owner_and_sorts_by_title(pool: PgPool) {
    let app = TestApp::new(pool);
    let (dave_id, dave) = app.signup("dave").await;
    let (_, erin) = app.signup("erin").await;
    for title in ["banana", "apple", "cherry"] {
        app.upload_video(&dave, title, true).await;
    }
    app.upload_video(&erin, "aardvark", true).await;

    let response = app
        .get(
            &format!("/api/v1/video?userId={dave_id}&sortBy=title&sortType=asc"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let titles: Vec<&str> = json["data"]["docs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["apple", "banana", "cherry"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn listing_search_matches_metacharacters_literally(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, token) = app.signup("frank").await;
    app.upload_video(&token, "100% legit", true).await;
    app.upload_video(&token, "1000 legit", true).await;

    let response = app.get("/api/v1/video?query=0%25", None).await;
    let json = body_json(response).await;
    let docs = json["data"]["docs"].as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["title"], "100% legit");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn listing_shows_own_drafts_only_to_owner(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("grace").await;
    let (_, other) = app.signup("heidi").await;
    app.upload_video(&owner, "public", true).await;
    app.upload_video(&owner, "draft", false).await;

    let total = |json: serde_json::Value| json["data"]["pagination"]["totalDocs"].clone();
    assert_eq!(total(body_json(app.get("/api/v1/video", Some(&owner)).await).await), 2);
    assert_eq!(total(body_json(app.get("/api/v1/video", Some(&other)).await).await), 1);
    assert_eq!(total(body_json(app.get("/api/v1/video", None).await).await), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn listing_rejects_invalid_filters(pool: PgPool) {
    let app = TestApp::new(pool);

    for uri in [
        "/api/v1/video?userId=64f1c0ffee",
        "/api/v1/video?sortBy=password_hash",
        "/api/v1/video?sortType=sideways",
    ] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn listing_clamps_limit(pool: PgPool) {
    let app = TestApp::new(pool);
    let json = body_json(app.get("/api/v1/video?limit=500&page=0", None).await).await;
    assert_eq!(json["data"]["pagination"]["limit"], 100);
    assert_eq!(json["data"]["pagination"]["page"], 1);
}

// ---------------------------------------------------------------------------
// Visibility and views
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn unpublished_video_is_hidden_until_published(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("ivan").await;
    let (_, other) = app.signup("judy").await;
    let id = app.upload_video(&owner, "secret", false).await;
    let uri = format!("/api/v1/video/{id}");

    assert_eq!(app.get(&uri, Some(&other)).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get(&uri, None).await.status(), StatusCode::NOT_FOUND);

    let as_owner = app.get(&uri, Some(&owner)).await;
    assert_eq!(as_owner.status(), StatusCode::OK);
    assert_eq!(body_json(as_owner).await["data"]["views"], 1);

    let toggled = app
        .send(
            axum::http::Request::builder()
                .method(Method::PATCH)
                .uri(format!("/api/v1/video/toggle/publish/{id}"))
                .header("authorization", format!("Bearer {owner}"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(toggled.status(), StatusCode::OK);
    assert_eq!(body_json(toggled).await["data"]["isPublished"], true);

    let as_other = app.get(&uri, Some(&other)).await;
    assert_eq!(as_other.status(), StatusCode::OK);
    let json = body_json(as_other).await;
    assert_eq!(json["data"]["views"], 2);
    assert_eq!(json["data"]["owner"]["username"], "ivan");
    assert_eq!(json["data"]["likesCount"], 0);
    assert_eq!(json["data"]["isSubscribed"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_video_is_404(pool: PgPool) {
    let app = TestApp::new(pool);
    let response = app.get("/api/v1/video/987654", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn only_the_owner_may_modify(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("ken").await;
    let (_, other) = app.signup("leo").await;
    let id = app.upload_video(&owner, "mine", true).await;

    let form = MultipartBody::new().text("title", "stolen");
    let response = app
        .multipart(Method::PATCH, &format!("/api/v1/video/{id}"), form, Some(&other))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.delete(&format!("/api/v1/video/{id}"), Some(&other)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn new_thumbnail_replaces_and_deletes_the_old_one(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("mia").await;
    let id = app.upload_video(&owner, "original", true).await;
    let before = app.media.public_ids();

    let form = MultipartBody::new()
        .text("description", "better description")
        .file("thumbnail", "new.jpg", b"new thumb");
    let response = app
        .multipart(Method::PATCH, &format!("/api/v1/video/{id}"), form, Some(&owner))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "original");
    assert_eq!(json["data"]["description"], "better description");

    let deleted = app.media.deleted();
    assert_eq!(deleted.len(), 1);
    assert!(before.contains(&deleted[0]));
    assert!(deleted[0].starts_with("image-"));
    let fresh: Vec<String> = app
        .media
        .public_ids()
        .into_iter()
        .filter(|p| !before.contains(p))
        .collect();
    assert_eq!(fresh.len(), 1);
    assert!(json["data"]["thumbnail"].as_str().unwrap().contains(&fresh[0]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_thumbnail_upload_keeps_the_old_one(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("nina").await;
    let id = app.upload_video(&owner, "original", true).await;
    app.media.fail_uploads(true);

    let form = MultipartBody::new().file("thumbnail", "new.jpg", b"new thumb");
    let response = app
        .multipart(Method::PATCH, &format!("/api/v1/video/{id}"), form, Some(&owner))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], "Failed to upload thumbnail");
    assert!(app.media.deleted().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn empty_update_is_rejected(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("omar").await;
    let id = app.upload_video(&owner, "original", true).await;

    let response = app
        .multipart(
            Method::PATCH,
            &format!("/api/v1/video/{id}"),
            MultipartBody::new(),
            Some(&owner),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_removes_row_and_both_assets(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let (_, owner) = app.signup("peggy").await;
    let avatar = app.media.public_ids();
    let id = app.upload_video(&owner, "doomed", true).await;
    app.post_json(
        &format!("/api/v1/comment/{id}"),
        json!({ "content": "first!" }),
        Some(&owner),
    )
    .await;

    let response = app.delete(&format!("/api/v1/video/{id}"), Some(&owner)).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(video_count(&pool).await, 0);
    let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(comments, 0);

    let deleted = app.media.deleted();
    assert_eq!(deleted.len(), 2);
    assert!(deleted.iter().any(|p| p.starts_with("video-")));
    assert!(deleted.iter().any(|p| p.starts_with("image-")));
    assert_eq!(app.media.public_ids(), avatar, "only the avatar remains");

    let again = app.get(&format!("/api/v1/video/{id}"), Some(&owner)).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_tolerates_assets_already_gone(pool: PgPool) {
    let app = TestApp::new(pool.clone());
    let (_, owner) = app.signup("quinn").await;
    let id = app.upload_video(&owner, "half gone", true).await;

    let video_asset = app
        .media
        .public_ids()
        .into_iter()
        .find(|p| p.starts_with("video-"))
        .unwrap();
    app.media
        .delete(&video_asset, ResourceKind::Video)
        .await
        .unwrap();

    let response = app.delete(&format!("/api/v1/video/{id}"), Some(&owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(video_count(&pool).await, 0);
}
