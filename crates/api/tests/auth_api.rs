//! HTTP-level integration tests for first-run setup, login, token refresh,
//! logout, account lockout and user management.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    body_json, create_user, get, get_auth, post_json, post_json_auth, put_json_auth, send,
    TEST_PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;
use studio_db::repositories::UserRepo;

async fn login(app: axum::Router, email: &str, password: &str) -> axum::response::Response {
    post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": email, "password": password }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn setup_creates_first_admin_once(pool: PgPool) {
    let status = body_json(get(common::build_test_app(pool.clone()), "/api/v1/auth/setup-status").await).await;
    assert_eq!(status["data"]["needs_setup"], true);

    let body = json!({ "name": "Maria Lopez", "email": "Maria@Studio.test", "password": "long-enough-pw" });
    let response = post_json(common::build_test_app(pool.clone()), "/api/v1/auth/setup", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert_eq!(json["user"]["role"], "admin");
    assert_eq!(json["user"]["email"], "maria@studio.test");

    let response = post_json(common::build_test_app(pool.clone()), "/api/v1/auth/setup", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let status = body_json(get(common::build_test_app(pool), "/api/v1/auth/setup-status").await).await;
    assert_eq!(status["data"]["needs_setup"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn setup_rejects_weak_password(pool: PgPool) {
    let body = json!({ "name": "Maria", "email": "maria@studio.test", "password": "short" });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/setup", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Login / refresh / logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn login_success_returns_tokens(pool: PgPool) {
    let (user, _) = create_user(&pool, "Paula", "producer").await;

    let response = login(common::build_test_app(pool), "PAULA@studio.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["role"], "producer");
    assert!(json["user"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_wrong_password_or_unknown_email_is_401(pool: PgPool) {
    create_user(&pool, "Wren", "editor").await;

    let response = login(common::build_test_app(pool.clone()), "wren@studio.test", "incorrect").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(common::build_test_app(pool), "ghost@studio.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_inactive_user_is_403(pool: PgPool) {
    let (user, _) = create_user(&pool, "Ivy", "editor").await;
    UserRepo::deactivate(&pool, user.id).await.unwrap();

    let response = login(common::build_test_app(pool), "ivy@studio.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn account_locks_after_five_failures(pool: PgPool) {
    create_user(&pool, "Lou", "editor").await;

    for _ in 0..5 {
        let response = login(common::build_test_app(pool.clone()), "lou@studio.test", "nope").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked.
    let response = login(common::build_test_app(pool), "lou@studio.test", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn replayed_refresh_token_yields_one_session(pool: PgPool) {
    create_user(&pool, "Rio", "editor").await;
    let first = body_json(login(common::build_test_app(pool.clone()), "rio@studio.test", TEST_PASSWORD).await).await;
    let body = json!({ "refresh_token": first["refresh_token"] });

    let (a, b) = tokio::join!(
        post_json(common::build_test_app(pool.clone()), "/api/v1/auth/refresh", body.clone()),
        post_json(common::build_test_app(pool.clone()), "/api/v1/auth/refresh", body.clone()),
    );
    let mut statuses = [a.status(), b.status()];
    statuses.sort_by_key(|s| s.as_u16());
    assert_eq!(statuses, [StatusCode::OK, StatusCode::UNAUTHORIZED]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_rotates_and_logout_revokes(pool: PgPool) {
    create_user(&pool, "Rae", "editor").await;

    let first = body_json(login(common::build_test_app(pool.clone()), "rae@studio.test", TEST_PASSWORD).await).await;
    let refresh_token = first["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;
    assert_ne!(second["refresh_token"], first["refresh_token"]);

    // The old refresh token was revoked by rotation.
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let access = second["access_token"].as_str().unwrap();
    let response = send(
        common::build_test_app(pool.clone()),
        Method::POST,
        "/api/v1/auth/logout",
        Some(access),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/auth/refresh",
        json!({ "refresh_token": second["refresh_token"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn me_returns_current_user(pool: PgPool) {
    let (user, token) = create_user(&pool, "Mo", "client").await;

    let response = get_auth(common::build_test_app(pool), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], user.id);
    assert_eq!(json["data"]["role"], "client");
}

// ---------------------------------------------------------------------------
// User management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn only_admin_creates_users(pool: PgPool) {
    let (_, admin) = create_user(&pool, "Ada", "admin").await;
    let (_, producer) = create_user(&pool, "Pat", "producer").await;
    let body = json!({
        "name": "New Editor",
        "email": "new.editor@studio.test",
        "password": "long-enough-pw",
        "role": "editor"
    });

    let response =
        post_json_auth(common::build_test_app(pool.clone()), "/api/v1/users", &producer, body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(common::build_test_app(pool.clone()), "/api/v1/users", &admin, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["role"], "editor");

    // Producers may list.
    let response = get_auth(common::build_test_app(pool), "/api/v1/users", &producer).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn editors_cannot_list_users(pool: PgPool) {
    let (_, editor) = create_user(&pool, "Eddie", "editor").await;
    let response = get_auth(common::build_test_app(pool), "/api/v1/users", &editor).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_cannot_demote_self(pool: PgPool) {
    let (admin, token) = create_user(&pool, "Ada", "admin").await;
    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/users/{}", admin.id),
        &token,
        json!({ "role": "editor" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deactivated_user_access_token_stops_working(pool: PgPool) {
    let (_, admin) = create_user(&pool, "Ada", "admin").await;
    let (editor, token) = create_user(&pool, "Eli", "editor").await;

    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/users/{}", editor.id),
        &admin,
        json!({ "is_active": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(common::build_test_app(pool), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn role_change_applies_to_existing_token(pool: PgPool) {
    let (producer, token) = create_user(&pool, "Pat", "producer").await;
    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/users", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    UserRepo::update(
        &pool,
        producer.id,
        &studio_db::models::user::UpdateUser {
            role: Some("editor".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let response = get_auth(common::build_test_app(pool), "/api/v1/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
