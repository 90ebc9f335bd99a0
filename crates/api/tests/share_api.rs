//! Integration tests for share-link management and the public
//! `/share/{token}` surface.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    body_json, create_project, create_user, get, post_json, post_json_auth, put_json,
    put_json_auth, send,
};
use serde_json::json;
use sqlx::PgPool;
use studio_db::models::asset::{Asset, CreateAsset};
use studio_db::models::project::Project;
use studio_db::repositories::{AssetRepo, ProjectRepo};

async fn seed_asset(pool: &PgPool, project: &Project, name: &str) -> Asset {
    AssetRepo::create(
        pool,
        &CreateAsset {
            project_id: project.id,
            name: name.into(),
            asset_type: "image".into(),
            category: project.categories[0].clone(),
            url: Some(format!("https://cdn.example/{name}")),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

/// Create a link through the staff API and return `(token, json)`.
async fn create_link(pool: &PgPool, project_id: i64, link_type: &str) -> (String, serde_json::Value) {
    let (_, producer) = create_user(pool, &format!("Producer {link_type}"), "producer").await;
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/projects/{project_id}/share-links"),
        &producer,
        json!({ "link_type": link_type, "name": "Smith family" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await["data"].clone();
    (json["token"].as_str().unwrap().to_string(), json)
}

#[sqlx::test(migrations = "../db/migrations")]
async fn created_link_has_token_and_public_url(pool: PgPool) {
    let project = create_project(&pool, "Wedding", &["Ceremony"]).await;
    let (token, json) = create_link(&pool, project.id, "client").await;

    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(json["url"], format!("http://localhost:3001/share/{token}"));
    assert_eq!(json["link_type"], "client");
    assert_eq!(json["is_active"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_link_type_or_past_expiry_rejected(pool: PgPool) {
    let (_, producer) = create_user(&pool, "Pat", "producer").await;
    let project = create_project(&pool, "Wedding", &["Ceremony"]).await;
    let uri = format!("/api/v1/projects/{}/share-links", project.id);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        &producer,
        json!({ "link_type": "admin" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        common::build_test_app(pool),
        &uri,
        &producer,
        json!({ "link_type": "client", "expires_at": "2001-01-01T00:00:00Z" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn visitor_sees_project_without_assignees(pool: PgPool) {
    let project = create_project(&pool, "Wedding", &["Ceremony"]).await;
    seed_asset(&pool, &project, "IMG_1.jpg").await;
    let (token, _) = create_link(&pool, project.id, "client").await;

    let response = get(common::build_test_app(pool), &format!("/api/v1/share/{token}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await["data"].clone();
    assert_eq!(json["project_name"], "Wedding");
    assert_eq!(json["link_type"], "client");
    assert_eq!(json["settable_statuses"], json!([]));
    let assets = json["assets"].as_array().unwrap();
    assert_eq!(assets.len(), 1);
    assert!(assets[0].get("assigned_to").is_none());
    assert_eq!(assets[0]["feedback"], json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_token_is_404(pool: PgPool) {
    let response = get(
        common::build_test_app(pool.clone()),
        "/api/v1/share/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(common::build_test_app(pool), "/api/v1/share/short").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deactivated_link_is_403(pool: PgPool) {
    let (_, producer) = create_user(&pool, "Pat", "producer").await;
    let project = create_project(&pool, "Wedding", &["Ceremony"]).await;
    let (token, json) = create_link(&pool, project.id, "client").await;

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/share-links/{}", json["id"]),
        &producer,
        json!({ "is_active": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(common::build_test_app(pool), &format!("/api/v1/share/{token}")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn expired_link_is_410(pool: PgPool) {
    let project = create_project(&pool, "Wedding", &["Ceremony"]).await;
    let (token, json) = create_link(&pool, project.id, "client").await;
    sqlx::query("UPDATE share_links SET expires_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(json["id"].as_i64().unwrap())
        .execute(&pool)
        .await
        .unwrap();

    let response = get(common::build_test_app(pool), &format!("/api/v1/share/{token}")).await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn client_comments_selects_and_confirms(pool: PgPool) {
    let project = create_project(&pool, "Wedding", &["Ceremony"]).await;
    let asset = seed_asset(&pool, &project, "IMG_1.jpg").await;
    let (token, _) = create_link(&pool, project.id, "client").await;
    let base = format!("/api/v1/share/{token}");

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("{base}/assets/{}/feedback", asset.id),
        json!({ "author_name": "Jane Smith", "text": "Love this one" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let feedback = body_json(response).await["data"].clone();
    assert_eq!(feedback["author_name"], "Jane Smith");
    assert!(feedback["author_user_id"].is_null());
    assert!(feedback["share_link_id"].is_number());

    // Nothing selected yet.
    let response = send(
        common::build_test_app(pool.clone()),
        Method::POST,
        &format!("{base}/confirm-selection"),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("{base}/assets/{}/selection", asset.id),
        json!({ "selected": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "selected");

    let response = send(
        common::build_test_app(pool.clone()),
        Method::POST,
        &format!("{base}/confirm-selection"),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["selection_confirmed"], true);

    // Selection is frozen once confirmed.
    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("{base}/assets/{}/selection", asset.id),
        json!({ "selected": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let project = ProjectRepo::find_by_id(&pool, project.id).await.unwrap().unwrap();
    assert!(project.selection_confirmed);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn client_cannot_set_status(pool: PgPool) {
    let project = create_project(&pool, "Wedding", &["Ceremony"]).await;
    let asset = seed_asset(&pool, &project, "IMG_1.jpg").await;
    let (token, _) = create_link(&pool, project.id, "client").await;

    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/share/{token}/assets/{}/status", asset.id),
        json!({ "status": "approved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn editor_link_moves_work_and_resolves_feedback(pool: PgPool) {
    let project = create_project(&pool, "Wedding", &["Ceremony"]).await;
    let asset = seed_asset(&pool, &project, "clip.mp4").await;
    AssetRepo::update_status(&pool, asset.id, "assigned").await.unwrap();
    let (client_token, _) = create_link(&pool, project.id, "client").await;
    let (token, _) = create_link(&pool, project.id, "editor").await;
    let base = format!("/api/v1/share/{token}");

    // Editors may not select.
    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("{base}/assets/{}/selection", asset.id),
        json!({ "selected": true }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Only in-progress and review-ready are settable.
    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("{base}/assets/{}/status", asset.id),
        json!({ "status": "approved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    for status in ["in-progress", "review-ready"] {
        let response = put_json(
            common::build_test_app(pool.clone()),
            &format!("{base}/assets/{}/status", asset.id),
            json!({ "status": status, "author_name": "Remote Editor" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["status"], status);
    }

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/share/{client_token}/assets/{}/feedback", asset.id),
        json!({ "text": "Warmer colours please", "video_timestamp": 3.0 }),
    )
    .await;
    let feedback = body_json(response).await["data"].clone();
    // No author name given: the link name is used.
    assert_eq!(feedback["author_name"], "Smith family");

    let response = send(
        common::build_test_app(pool.clone()),
        Method::PUT,
        &format!("{base}/feedback/{}/done", feedback["id"]),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_done"], true);

    // Client links cannot resolve feedback.
    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/share/{client_token}/feedback/{}/done", feedback["id"]),
        json!({ "is_done": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn link_cannot_reach_other_projects_assets(pool: PgPool) {
    let project = create_project(&pool, "Wedding", &["Ceremony"]).await;
    let other = create_project(&pool, "Gala", &["Venue"]).await;
    let foreign = seed_asset(&pool, &other, "IMG_9.jpg").await;
    let (token, _) = create_link(&pool, project.id, "client").await;

    let response = post_json(
        common::build_test_app(pool),
        &format!("/api/v1/share/{token}/assets/{}/feedback", foreign.id),
        json!({ "text": "hello" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
