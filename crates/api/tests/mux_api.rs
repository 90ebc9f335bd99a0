//! Integration tests for Mux direct uploads and the webhook receiver.
//!
//! Uploads run against [`common::FakeVideo`]; no request reaches Mux.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{
    body_json, create_project, create_user, get_auth, post_json_auth, test_config,
    WEBHOOK_SECRET,
};
use serde_json::json;
use sqlx::PgPool;
use studio_core::hashing::hmac_sha256_hex;
use studio_db::models::asset::CreateAsset;
use studio_db::repositories::AssetRepo;
use tower::ServiceExt;

fn signed_app(pool: PgPool) -> Router {
    let mut config = test_config();
    config.mux_webhook_secret = Some(WEBHOOK_SECRET.to_string());
    common::build_app_with_config(pool, config, true)
}

fn signature(body: &str) -> String {
    let t = chrono::Utc::now().timestamp();
    let sig = hmac_sha256_hex(WEBHOOK_SECRET.as_bytes(), format!("{t}.{body}").as_bytes());
    format!("t={t},v1={sig}")
}

async fn deliver(app: Router, body: &str, signature: Option<String>) -> axum::response::Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/mux/webhook")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("mux-signature", sig);
    }
    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn seed_video(pool: &PgPool, upload_id: Option<&str>) -> i64 {
    let project = create_project(pool, "Wedding", &["Film"]).await;
    AssetRepo::create(
        pool,
        &CreateAsset {
            project_id: project.id,
            name: "ceremony.mp4".into(),
            asset_type: "video".into(),
            category: project.categories[0].clone(),
            mux_upload_id: upload_id.map(str::to_string),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_creates_video_asset_and_poll_copies_playback(pool: PgPool) {
    let (_, token) = create_user(&pool, "Pat", "producer").await;
    let project = create_project(&pool, "Wedding", &["Film"]).await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/mux/upload",
        &token,
        json!({ "project_id": project.id, "category": "Film", "name": "ceremony.mp4" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["upload_id"], "up_1");
    assert_eq!(json["upload_url"], "https://storage.mux.example/up_1");

    let asset_id = json["asset_id"].as_i64().unwrap();
    let asset = AssetRepo::find_by_id(&pool, asset_id).await.unwrap().unwrap();
    assert_eq!(asset.asset_type, "video");
    assert_eq!(asset.mux_upload_id.as_deref(), Some("up_1"));

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/mux/upload/up_1",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await["data"].clone();
    assert_eq!(json["upload"]["asset_id"], "mux_1");
    assert_eq!(json["asset"]["mux_playback_id"], "pb_1");
    assert_eq!(json["asset"]["url"], "https://stream.mux.com/pb_1.m3u8");

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/mux/assets/{asset_id}"),
        &token,
    )
    .await;
    let json = body_json(response).await["data"].clone();
    assert_eq!(json["status"], "ready");
    assert_eq!(json["duration"], 42.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_requires_asset_or_project(pool: PgPool) {
    let (_, token) = create_user(&pool, "Pat", "producer").await;
    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/mux/upload",
        &token,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unconfigured_mux_is_503(pool: PgPool) {
    let (_, token) = create_user(&pool, "Pat", "producer").await;
    let asset_id = seed_video(&pool, None).await;

    let app = common::build_app_with_config(pool, test_config(), false);
    let response = get_auth(app, &format!("/api/v1/mux/assets/{asset_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn status_without_mux_asset_reports_none(pool: PgPool) {
    let (_, token) = create_user(&pool, "Pat", "producer").await;
    let asset_id = seed_video(&pool, None).await;

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/mux/assets/{asset_id}"),
        &token,
    )
    .await;
    let json = body_json(response).await["data"].clone();
    assert_eq!(json["status"], "none");
    assert!(json["mux_asset_id"].is_null());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn signed_ready_webhook_updates_asset(pool: PgPool) {
    let asset_id = seed_video(&pool, Some("up_9")).await;

    let created = json!({
        "type": "video.upload.asset_created",
        "data": { "id": "up_9", "asset_id": "mux_9" }
    })
    .to_string();
    let response = deliver(signed_app(pool.clone()), &created, Some(signature(&created))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let asset = AssetRepo::find_by_id(&pool, asset_id).await.unwrap().unwrap();
    assert_eq!(asset.mux_asset_id.as_deref(), Some("mux_9"));
    assert_eq!(asset.mux_status.as_deref(), Some("preparing"));

    let ready = json!({
        "type": "video.asset.ready",
        "data": {
            "id": "mux_9",
            "duration": 61.2,
            "playback_ids": [{ "id": "pb_9", "policy": "public" }]
        }
    })
    .to_string();
    let response = deliver(signed_app(pool.clone()), &ready, Some(signature(&ready))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["received"], true);

    let asset = AssetRepo::find_by_id(&pool, asset_id).await.unwrap().unwrap();
    assert_eq!(asset.mux_status.as_deref(), Some("ready"));
    assert_eq!(asset.mux_playback_id.as_deref(), Some("pb_9"));
    assert_eq!(
        asset.thumbnail.as_deref(),
        Some("https://image.mux.com/pb_9/thumbnail.jpg")
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn errored_webhook_matches_by_passthrough(pool: PgPool) {
    let asset_id = seed_video(&pool, None).await;
    let body = json!({
        "type": "video.asset.errored",
        "data": {
            "id": "mux_x",
            "passthrough": asset_id.to_string(),
            "errors": { "messages": ["unsupported codec"] }
        }
    })
    .to_string();

    let response = deliver(signed_app(pool.clone()), &body, Some(signature(&body))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let asset = AssetRepo::find_by_id(&pool, asset_id).await.unwrap().unwrap();
    assert_eq!(asset.mux_status.as_deref(), Some("errored"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn bad_or_missing_signature_is_401(pool: PgPool) {
    let body = json!({ "type": "video.asset.ready", "data": { "id": "mux_1" } }).to_string();

    let response = deliver(signed_app(pool.clone()), &body, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let forged = format!("t={},v1=deadbeef", chrono::Utc::now().timestamp());
    let response = deliver(signed_app(pool), &body, Some(forged)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_events_and_assets_are_acknowledged(pool: PgPool) {
    // No secret configured: unsigned deliveries are accepted.
    let app = || common::build_test_app(pool.clone());

    let body = json!({ "type": "video.live_stream.idle", "data": {} }).to_string();
    let response = deliver(app(), &body, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["received"], true);

    let body = json!({ "type": "video.asset.ready", "data": { "id": "mux_unknown" } }).to_string();
    let response = deliver(app(), &body, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = deliver(app(), "not json", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cancelled_upload_webhook_marks_asset(pool: PgPool) {
    let asset_id = seed_video(&pool, Some("up_9")).await;
    let body = json!({ "type": "video.upload.cancelled", "data": { "id": "up_9" } }).to_string();

    let response = deliver(common::build_test_app(pool.clone()), &body, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["received"], true);

    let asset = AssetRepo::find_by_id(&pool, asset_id).await.unwrap().unwrap();
    assert_eq!(asset.mux_status.as_deref(), Some("cancelled"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn out_of_range_signature_timestamp_is_401(pool: PgPool) {
    let body = json!({ "type": "video.asset.ready", "data": { "id": "mux_1" } }).to_string();

    for header in ["t=-9223372036854775808,v1=00", "t=9223372036854775807,v1=00"] {
        let response = deliver(signed_app(pool.clone()), &body, Some(header.to_string())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{header}");
    }
}
