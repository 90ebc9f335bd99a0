//! Integration tests for projects, categories, workflow phase, team
//! membership and project visibility.

mod common;

use axum::http::StatusCode;
use common::{
    add_to_team, body_json, create_project, create_user, delete_auth, get_auth, post_json_auth,
    put_json_auth,
};
use serde_json::json;
use sqlx::PgPool;
use studio_db::models::asset::CreateAsset;
use studio_db::repositories::AssetRepo;

#[sqlx::test(migrations = "../db/migrations")]
async fn producer_creates_project_with_categories(pool: PgPool) {
    let (_, producer) = create_user(&pool, "Pat", "producer").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/projects",
        &producer,
        json!({
            "name": "  Smith Wedding ",
            "client": "Smith Family",
            "project_type": "wedding",
            "categories": ["Ceremony", " Reception "]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Smith Wedding");
    assert_eq!(json["data"]["categories"], json!(["Ceremony", "Reception"]));
    assert_eq!(json["data"]["workflow_phase"], "upload");
    assert_eq!(json["data"]["selection_confirmed"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_categories_are_rejected(pool: PgPool) {
    let (_, producer) = create_user(&pool, "Pat", "producer").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/projects",
        &producer,
        json!({ "name": "Dupes", "categories": ["Ceremony", "ceremony"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn editors_cannot_create_projects(pool: PgPool) {
    let (_, editor) = create_user(&pool, "Eddie", "editor").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/projects",
        &editor,
        json!({ "name": "Nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn non_staff_only_see_their_projects(pool: PgPool) {
    let (editor, token) = create_user(&pool, "Eddie", "editor").await;
    let mine = create_project(&pool, "Mine", &["Ceremony"]).await;
    let other = create_project(&pool, "Other", &["Ceremony"]).await;
    add_to_team(&pool, mine.id, editor.id).await;

    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/projects", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![mine.id]);

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/projects/{}", other.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_project_is_404(pool: PgPool) {
    let (_, admin) = create_user(&pool, "Ada", "admin").await;
    let response = get_auth(common::build_test_app(pool), "/api/v1/projects/999999", &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn category_in_use_cannot_be_removed(pool: PgPool) {
    let (_, producer) = create_user(&pool, "Pat", "producer").await;
    let project = create_project(&pool, "Gala", &["Portraits", "Venue"]).await;
    AssetRepo::create(
        &pool,
        &CreateAsset {
            project_id: project.id,
            name: "IMG_0001.jpg".into(),
            asset_type: "image".into(),
            category: "Portraits".into(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/projects/{}/categories/Portraits", project.id),
        &producer,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/projects/{}/categories/venue", project.id),
        &producer,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["categories"], json!(["Portraits"]));

    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/projects/{}/categories", project.id),
        &producer,
        json!({ "name": "Details" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["categories"], json!(["Portraits", "Details"]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn phase_advances_one_step_at_a_time(pool: PgPool) {
    let (_, producer) = create_user(&pool, "Pat", "producer").await;
    let project = create_project(&pool, "Gala", &["Venue"]).await;
    let uri = format!("/api/v1/projects/{}/phase", project.id);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        &producer,
        json!({ "phase": "review" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        &producer,
        json!({ "phase": "selection" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["workflow_phase"], "selection");

    // Moving back is allowed.
    let response = put_json_auth(
        common::build_test_app(pool),
        &uri,
        &producer,
        json!({ "phase": "upload" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn confirm_selection_requires_a_selected_asset(pool: PgPool) {
    let (_, producer) = create_user(&pool, "Pat", "producer").await;
    let project = create_project(&pool, "Gala", &["Venue"]).await;
    let uri = format!("/api/v1/projects/{}/confirm-selection", project.id);

    let response = post_json_auth(common::build_test_app(pool.clone()), &uri, &producer, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let asset = AssetRepo::create(
        &pool,
        &CreateAsset {
            project_id: project.id,
            name: "IMG_1.jpg".into(),
            asset_type: "image".into(),
            category: "Venue".into(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    AssetRepo::update_status(&pool, asset.id, "selected").await.unwrap();

    let response = post_json_auth(common::build_test_app(pool.clone()), &uri, &producer, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["selection_confirmed"], true);

    let response = post_json_auth(common::build_test_app(pool), &uri, &producer, json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn team_membership_grants_access(pool: PgPool) {
    let (_, producer) = create_user(&pool, "Pat", "producer").await;
    let (editor, editor_token) = create_user(&pool, "Eddie", "editor").await;
    let project = create_project(&pool, "Gala", &["Venue"]).await;
    let project_uri = format!("/api/v1/projects/{}", project.id);

    let response = get_auth(common::build_test_app(pool.clone()), &project_uri, &editor_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("{project_uri}/team"),
        &producer,
        json!({ "user_id": editor.id, "role_label": "Lead Editor" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["role_label"], "Lead Editor");

    let response = get_auth(common::build_test_app(pool.clone()), &project_uri, &editor_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("{project_uri}/team/{}", editor.id),
        &producer,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(common::build_test_app(pool), &project_uri, &editor_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
