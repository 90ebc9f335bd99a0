#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use studio_api::auth::jwt::{generate_access_token, JwtConfig};
use studio_api::auth::password::hash_password;
use studio_api::config::ServerConfig;
use studio_api::router::build_app_router;
use studio_api::state::AppState;
use studio_db::models::project::{CreateProject, Project};
use studio_db::models::user::{CreateUser, User};
use studio_db::repositories::{ProjectRepo, TeamRepo, UserRepo};
use studio_events::EventBus;
use studio_media::mux::{DirectUpload, MuxAsset, MuxError, PlaybackId};
use studio_media::storage::LocalStorageConfig;
use studio_media::{LocalStorage, VideoPipeline};

pub const TEST_PASSWORD: &str = "test_password_123!";
pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Build a test `ServerConfig` with safe defaults and a throwaway storage dir.
pub fn test_config() -> ServerConfig {
    let root_path = std::env::temp_dir().join(format!("studio-test-{}", uuid::Uuid::new_v4()));
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3001".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        app_url: "http://localhost:3001".to_string(),
        max_upload_bytes: 10 * 1024 * 1024,
        mux_webhook_secret: None,
        storage: LocalStorageConfig {
            root_path,
            public_url: "http://localhost:3000/files".to_string(),
        },
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// A video pipeline that answers from fixed data instead of calling Mux.
///
/// Upload `up_1` has produced Mux asset `mux_1`, which is ready with public
/// playback id `pb_1`.
pub struct FakeVideo;

#[async_trait]
impl VideoPipeline for FakeVideo {
    async fn create_direct_upload(
        &self,
        _cors_origin: &str,
        _passthrough: Option<&str>,
    ) -> Result<DirectUpload, MuxError> {
        Ok(DirectUpload {
            id: "up_1".into(),
            url: Some("https://storage.mux.example/up_1".into()),
            status: "waiting".into(),
            asset_id: None,
        })
    }

    async fn get_upload(&self, upload_id: &str) -> Result<DirectUpload, MuxError> {
        if upload_id != "up_1" {
            return Err(MuxError::NotFound(upload_id.to_string()));
        }
        Ok(DirectUpload {
            id: "up_1".into(),
            url: None,
            status: "asset_created".into(),
            asset_id: Some("mux_1".into()),
        })
    }

    async fn get_asset(&self, asset_id: &str) -> Result<MuxAsset, MuxError> {
        if asset_id != "mux_1" {
            return Err(MuxError::NotFound(asset_id.to_string()));
        }
        Ok(MuxAsset {
            id: "mux_1".into(),
            status: "ready".into(),
            playback_ids: vec![PlaybackId {
                id: "pb_1".into(),
                policy: "public".into(),
            }],
            duration: Some(42.0),
            upload_id: Some("up_1".into()),
            passthrough: None,
        })
    }
}

pub fn build_state(pool: PgPool, config: &ServerConfig, with_video: bool) -> AppState {
    let video: Option<Arc<dyn VideoPipeline>> = if with_video {
        Some(Arc::new(FakeVideo))
    } else {
        None
    };
    AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
        storage: Arc::new(LocalStorage::new(config.storage.clone())),
        video,
        email: None,
    }
}

/// Build the full application router, including the fake video pipeline.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_with_config(pool, test_config(), true)
}

pub fn build_app_with_config(pool: PgPool, config: ServerConfig, with_video: bool) -> Router {
    let state = build_state(pool, &config, with_video);
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] and return it with an access token.
pub async fn create_user(pool: &PgPool, name: &str, role: &str) -> (User, String) {
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            email: format!("{}@studio.test", name.to_lowercase().replace(' ', ".")),
            password_hash,
            role: role.to_string(),
            is_core: role != "client",
            is_freelancer: false,
            is_client: role == "client",
        },
    )
    .await
    .expect("user creation should succeed");

    let token = generate_access_token(user.id, &user.role, &user.name, &test_config().jwt)
        .expect("token generation should succeed");
    (user, token)
}

pub async fn create_project(pool: &PgPool, name: &str, categories: &[&str]) -> Project {
    ProjectRepo::create(
        pool,
        &CreateProject {
            name: name.to_string(),
            client: "Acme".to_string(),
            project_type: "wedding".to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            due_date: None,
            created_by: None,
        },
    )
    .await
    .expect("project creation should succeed")
}

pub async fn add_to_team(pool: &PgPool, project_id: i64, user_id: i64) {
    TeamRepo::upsert(pool, project_id, user_id, "Editor")
        .await
        .expect("team upsert should succeed");
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, None, Some(body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
