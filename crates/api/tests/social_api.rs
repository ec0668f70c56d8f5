//! Comments, likes, subscriptions, playlists and poll posts.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn comments_are_listed_newest_first_with_owner(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("alice").await;
    let (_, fan) = app.signup("bob").await;
    let video = app.upload_video(&owner, "talk", true).await;

    for text in ["one", "two", "three"] {
        let response = app
            .post_json(
                &format!("/api/v1/comment/{video}"),
                json!({ "content": text }),
                Some(&fan),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .get(&format!("/api/v1/comment/{video}?page=1&limit=2"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let docs = json["data"]["docs"].as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["content"], "three");
    assert_eq!(docs[0]["owner"]["username"], "bob");
    assert_eq!(docs[0]["likesCount"], 0);
    assert_eq!(json["data"]["pagination"]["totalDocs"], 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn comments_on_hidden_videos_are_404(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("carol").await;
    let (_, other) = app.signup("dave").await;
    let draft = app.upload_video(&owner, "draft", false).await;

    let listed = app.get(&format!("/api/v1/comment/{draft}"), Some(&other)).await;
    assert_eq!(listed.status(), StatusCode::NOT_FOUND);

    let posted = app
        .post_json(
            &format!("/api/v1/comment/{draft}"),
            json!({ "content": "hi" }),
            Some(&other),
        )
        .await;
    assert_eq!(posted.status(), StatusCode::NOT_FOUND);

    let blank = app
        .post_json(
            &format!("/api/v1/comment/{draft}"),
            json!({ "content": "   " }),
            Some(&owner),
        )
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_the_comment_owner_may_edit_or_delete(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("erin").await;
    let (_, other) = app.signup("frank").await;
    let video = app.upload_video(&owner, "v", true).await;

    let created = app
        .post_json(
            &format!("/api/v1/comment/{video}"),
            json!({ "content": "original" }),
            Some(&owner),
        )
        .await;
    let comment = body_json(created).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/comment/c/{comment}");

    let hijack = app
        .patch_json(&uri, json!({ "content": "hijacked" }), Some(&other))
        .await;
    assert_eq!(hijack.status(), StatusCode::FORBIDDEN);

    let edited = app
        .patch_json(&uri, json!({ "content": "edited" }), Some(&owner))
        .await;
    assert_eq!(edited.status(), StatusCode::OK);
    assert_eq!(body_json(edited).await["data"]["content"], "edited");

    assert_eq!(app.delete(&uri, Some(&other)).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&uri, Some(&owner)).await.status(), StatusCode::OK);
    assert_eq!(app.delete(&uri, Some(&owner)).await.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn like_toggles_come_in_pairs(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("grace").await;
    let (_, fan) = app.signup("heidi").await;
    let video = app.upload_video(&owner, "likeable", true).await;
    let uri = format!("/api/v1/likes/toggle/v/{video}");

    let first = body_json(app.post_json(&uri, json!({}), Some(&fan)).await).await;
    assert_eq!(first["data"]["isLiked"], true);

    let liked = body_json(app.get("/api/v1/likes/videos", Some(&fan)).await).await;
    assert_eq!(liked["data"].as_array().unwrap().len(), 1);
    assert_eq!(liked["data"][0]["id"], video);

    let detail = body_json(app.get(&format!("/api/v1/video/{video}"), Some(&fan)).await).await;
    assert_eq!(detail["data"]["likesCount"], 1);
    assert_eq!(detail["data"]["isLiked"], true);

    let second = body_json(app.post_json(&uri, json!({}), Some(&fan)).await).await;
    assert_eq!(second["data"]["isLiked"], false);

    let liked = body_json(app.get("/api/v1/likes/videos", Some(&fan)).await).await;
    assert!(liked["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn liking_missing_targets_is_404(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, token) = app.signup("ivan").await;

    for uri in [
        "/api/v1/likes/toggle/v/4242",
        "/api/v1/likes/toggle/c/4242",
        "/api/v1/likes/toggle/p/4242",
    ] {
        let response = app.post_json(uri, json!({}), Some(&token)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn comment_likes_show_up_in_listing(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("judy").await;
    let video = app.upload_video(&owner, "v", true).await;
    let created = app
        .post_json(
            &format!("/api/v1/comment/{video}"),
            json!({ "content": "like me" }),
            Some(&owner),
        )
        .await;
    let comment = body_json(created).await["data"]["id"].as_i64().unwrap();

    let toggled = app
        .post_json(&format!("/api/v1/likes/toggle/c/{comment}"), json!({}), Some(&owner))
        .await;
    assert_eq!(body_json(toggled).await["data"]["isLiked"], true);

    let listed = body_json(app.get(&format!("/api/v1/comment/{video}"), None).await).await;
    assert_eq!(listed["data"]["docs"][0]["likesCount"], 1);
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn subscription_toggle_and_listings(pool: PgPool) {
    let app = TestApp::new(pool);
    let (channel_id, channel) = app.signup("ken").await;
    let (fan_id, fan) = app.signup("leo").await;
    let uri = format!("/api/v1/subscriptions/c/{channel_id}");

    let on = body_json(app.post_json(&uri, json!({}), Some(&fan)).await).await;
    assert_eq!(on["data"]["isSubscribed"], true);

    let subscribers = body_json(app.get(&uri, Some(&channel)).await).await;
    let list = subscribers["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["user"]["username"], "leo");

    let channels = body_json(
        app.get(&format!("/api/v1/subscriptions/u/{fan_id}"), Some(&fan))
            .await,
    )
    .await;
    assert_eq!(channels["data"][0]["user"]["username"], "ken");
    assert_eq!(channels["data"][0]["subscribersCount"], 1);

    let off = body_json(app.post_json(&uri, json!({}), Some(&fan)).await).await;
    assert_eq!(off["data"]["isSubscribed"], false);
    let subscribers = body_json(app.get(&uri, Some(&channel)).await).await;
    assert!(subscribers["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cannot_subscribe_to_self_or_missing_channel(pool: PgPool) {
    let app = TestApp::new(pool);
    let (me, token) = app.signup("mia").await;

    let own = app
        .post_json(&format!("/api/v1/subscriptions/c/{me}"), json!({}), Some(&token))
        .await;
    assert_eq!(own.status(), StatusCode::BAD_REQUEST);

    let missing = app
        .post_json("/api/v1/subscriptions/c/999999", json!({}), Some(&token))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Playlists
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn playlist_membership_is_ordered_and_idempotent(pool: PgPool) {
    let app = TestApp::new(pool);
    let (owner_id, owner) = app.signup("nina").await;
    let first = app.upload_video(&owner, "first", true).await;
    let second = app.upload_video(&owner, "second", true).await;

    let created = app
        .post_json(
            "/api/v1/playlist",
            json!({ "name": "Favourites", "description": "best of" }),
            Some(&owner),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let playlist = body_json(created).await["data"]["id"].as_i64().unwrap();

    for video in [second, first, second] {
        let response = app
            .json(
                Method::PATCH,
                &format!("/api/v1/playlist/add/{video}/{playlist}"),
                json!({}),
                Some(&owner),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let detail = body_json(app.get(&format!("/api/v1/playlist/{playlist}"), None).await).await;
    let ids: Vec<i64> = detail["data"]["videos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, [second, first]);
    assert_eq!(detail["data"]["totalVideos"], 2);

    let removed = app
        .json(
            Method::PATCH,
            &format!("/api/v1/playlist/remove/{second}/{playlist}"),
            json!({}),
            Some(&owner),
        )
        .await;
    assert_eq!(removed.status(), StatusCode::OK);
    let again = app
        .json(
            Method::PATCH,
            &format!("/api/v1/playlist/remove/{second}/{playlist}"),
            json!({}),
            Some(&owner),
        )
        .await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let mine = body_json(app.get(&format!("/api/v1/playlist/user/{owner_id}"), None).await).await;
    assert_eq!(mine["data"][0]["name"], "Favourites");
    assert_eq!(mine["data"][0]["totalVideos"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_the_playlist_owner_may_change_it(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("omar").await;
    let (_, other) = app.signup("peggy").await;
    let video = app.upload_video(&other, "theirs", true).await;

    let created = app
        .post_json("/api/v1/playlist", json!({ "name": "Mine" }), Some(&owner))
        .await;
    let playlist = body_json(created).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/playlist/{playlist}");

    let renamed = app
        .patch_json(&uri, json!({ "name": "Stolen" }), Some(&other))
        .await;
    assert_eq!(renamed.status(), StatusCode::FORBIDDEN);

    let added = app
        .json(
            Method::PATCH,
            &format!("/api/v1/playlist/add/{video}/{playlist}"),
            json!({}),
            Some(&other),
        )
        .await;
    assert_eq!(added.status(), StatusCode::FORBIDDEN);

    // The owner may add someone else's published video.
    let added = app
        .json(
            Method::PATCH,
            &format!("/api/v1/playlist/add/{video}/{playlist}"),
            json!({}),
            Some(&owner),
        )
        .await;
    assert_eq!(added.status(), StatusCode::OK);

    assert_eq!(app.delete(&uri, Some(&other)).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&uri, Some(&owner)).await.status(), StatusCode::OK);
    assert_eq!(app.get(&uri, None).await.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Posts and polls
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn poll_votes_are_one_per_user_and_movable(pool: PgPool) {
    let app = TestApp::new(pool);
    let (owner_id, owner) = app.signup("quinn").await;
    let (_, voter) = app.signup("rita").await;

    let created = app
        .post_json(
            "/api/v1/posts",
            json!({ "content": "Best snack?", "options": ["Chips", "Fruit", "Nuts"] }),
            Some(&owner),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let json = body_json(created).await;
    let post = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["options"].as_array().unwrap().len(), 3);
    assert_eq!(json["data"]["options"][1]["label"], "Fruit");

    let vote_uri = format!("/api/v1/posts/{post}/vote");
    let voted = body_json(app.post_json(&vote_uri, json!({ "option": 1 }), Some(&voter)).await).await;
    assert_eq!(voted["data"]["myVote"], 1);
    assert_eq!(voted["data"]["options"][1]["votes"], 1);

    let moved = body_json(app.post_json(&vote_uri, json!({ "option": 2 }), Some(&voter)).await).await;
    assert_eq!(moved["data"]["options"][1]["votes"], 0);
    assert_eq!(moved["data"]["options"][2]["votes"], 1);

    let out_of_range = app
        .post_json(&vote_uri, json!({ "option": 3 }), Some(&voter))
        .await;
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

    let listed = body_json(
        app.get(&format!("/api/v1/posts/user/{owner_id}"), Some(&voter))
            .await,
    )
    .await;
    let first = &listed["data"][0];
    assert_eq!(first["myVote"], 2);
    assert_eq!(first["options"][2]["votes"], 1);
    assert_eq!(first["owner"]["username"], "quinn");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn plain_posts_cannot_be_voted_on(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("sam").await;

    let created = app
        .post_json("/api/v1/posts", json!({ "content": "just text" }), Some(&owner))
        .await;
    let post = body_json(created).await["data"]["id"].as_i64().unwrap();

    let vote = app
        .post_json(&format!("/api/v1/posts/{post}/vote"), json!({ "option": 0 }), Some(&owner))
        .await;
    assert_eq!(vote.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn polls_need_two_distinct_options(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("tess").await;

    for options in [json!(["only one"]), json!(["same", "SAME"]), json!(["ok", ""])] {
        let response = app
            .post_json(
                "/api/v1/posts",
                json!({ "content": "poll", "options": options }),
                Some(&owner),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{options}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn post_edits_are_owner_only(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, owner) = app.signup("uma").await;
    let (_, other) = app.signup("vic").await;

    let created = app
        .post_json("/api/v1/posts", json!({ "content": "draft" }), Some(&owner))
        .await;
    let post = body_json(created).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/posts/{post}");

    let hijack = app
        .patch_json(&uri, json!({ "content": "mine now" }), Some(&other))
        .await;
    assert_eq!(hijack.status(), StatusCode::FORBIDDEN);

    let edited = app
        .patch_json(&uri, json!({ "content": "final" }), Some(&owner))
        .await;
    assert_eq!(body_json(edited).await["data"]["content"], "final");

    assert_eq!(app.delete(&uri, Some(&owner)).await.status(), StatusCode::OK);
    let vote = app
        .post_json(&format!("{uri}/vote"), json!({ "option": 0 }), Some(&owner))
        .await;
    assert_eq!(vote.status(), StatusCode::NOT_FOUND);
}
