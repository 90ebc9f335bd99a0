//! Integration tests for the repository layer against a real database:
//! - Project, asset, version, feedback and share-link lifecycles
//! - Cascade delete behaviour
//! - Unique constraint violations

use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use studio_db::models::activity::CreateActivity;
use studio_db::models::asset::{AssetFilter, CreateAsset, MuxAssetUpdate, UpdateAsset};
use studio_db::models::asset_version::CreateAssetVersion;
use studio_db::models::feedback::{CreateFeedback, UpdateFeedback};
use studio_db::models::notification::CreateNotification;
use studio_db::models::project::{CreateProject, UpdateProject};
use studio_db::models::session::CreateSession;
use studio_db::models::share_link::{CreateShareLink, UpdateShareLink};
use studio_db::models::user::CreateUser;
use studio_db::repositories::{
    ActivityRepo, AnnotationRepo, AssetRepo, AssetVersionRepo, FeedbackRepo, NotificationRepo,
    ProjectRepo, SessionRepo, ShareLinkRepo, TeamRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_project(name: &str) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        client: "Acme".to_string(),
        project_type: "wedding".to_string(),
        categories: vec!["Ceremony".to_string()],
        due_date: None,
        created_by: None,
    }
}

fn new_asset(project_id: i64, name: &str) -> CreateAsset {
    CreateAsset {
        project_id,
        name: name.to_string(),
        asset_type: "image".to_string(),
        category: "Ceremony".to_string(),
        url: Some(format!("http://files/{name}")),
        ..Default::default()
    }
}

async fn new_user(pool: &PgPool, name: &str, email: &str, role: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
            is_core: true,
            is_freelancer: false,
            is_client: false,
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_project_create_update_and_defaults(pool: PgPool) {
    let project = ProjectRepo::create(&pool, &new_project("Smith Wedding"))
        .await
        .unwrap();
    assert_eq!(project.status, "active");
    assert_eq!(project.workflow_phase, "upload");
    assert!(!project.selection_confirmed);
    assert_eq!(project.categories, vec!["Ceremony"]);

    let updated = ProjectRepo::update(
        &pool,
        project.id,
        &UpdateProject {
            status: Some("completed".to_string()),
            due_date: NaiveDate::from_ymd_opt(2026, 6, 1),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.status, "completed");
    assert_eq!(updated.name, "Smith Wedding");
    assert!(updated.updated_at >= project.updated_at);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_project_summaries_count_assets(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    let a = AssetRepo::create(&pool, &new_asset(p.id, "a")).await.unwrap();
    AssetRepo::create(&pool, &new_asset(p.id, "b")).await.unwrap();
    AssetRepo::update_status(&pool, a.id, "approved").await.unwrap();

    let summaries = ProjectRepo::list_summaries(&pool, None, None).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].asset_count, 2);
    assert_eq!(summaries[0].approved_count, 1);

    let none = ProjectRepo::list_summaries(&pool, Some("completed"), None)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_member_filter_limits_projects(pool: PgPool) {
    let user = new_user(&pool, "Ed", "ed@example.com", "editor").await;
    let visible = ProjectRepo::create(&pool, &new_project("Mine")).await.unwrap();
    ProjectRepo::create(&pool, &new_project("Other")).await.unwrap();
    TeamRepo::upsert(&pool, visible.id, user, "Editor").await.unwrap();

    let list = ProjectRepo::list_summaries(&pool, None, Some(user)).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, visible.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_confirm_selection_advances_phase_once(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    ProjectRepo::set_phase(&pool, p.id, "selection").await.unwrap();

    let confirmed = ProjectRepo::confirm_selection(&pool, p.id).await.unwrap().unwrap();
    assert!(confirmed.selection_confirmed);
    assert_eq!(confirmed.workflow_phase, "editing");

    assert!(ProjectRepo::confirm_selection(&pool, p.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_project_delete_cascades(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    let a = AssetRepo::create(&pool, &new_asset(p.id, "a")).await.unwrap();
    ShareLinkRepo::create(
        &pool,
        p.id,
        "tok",
        &CreateShareLink {
            link_type: "client".into(),
            name: String::new(),
            expires_at: None,
        },
        None,
    )
    .await
    .unwrap();

    assert!(ProjectRepo::delete(&pool, p.id).await.unwrap());
    assert!(AssetRepo::find_by_id(&pool, a.id).await.unwrap().is_none());
    assert!(ShareLinkRepo::find_by_token(&pool, "tok").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_team_upsert_and_remove(pool: PgPool) {
    let user = new_user(&pool, "Maria Lopez", "maria@example.com", "editor").await;
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();

    TeamRepo::upsert(&pool, p.id, user, "Photographer").await.unwrap();
    let member = TeamRepo::upsert(&pool, p.id, user, "Lead Editor").await.unwrap();
    assert_eq!(member.role_label, "Lead Editor");
    assert_eq!(member.name, "Maria Lopez");

    let team = TeamRepo::list_for_project(&pool, p.id).await.unwrap();
    assert_eq!(team.len(), 1);
    assert!(TeamRepo::is_member(&pool, p.id, user).await.unwrap());

    assert!(TeamRepo::remove(&pool, p.id, user).await.unwrap());
    assert!(!TeamRepo::remove(&pool, p.id, user).await.unwrap());
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_asset_filters_and_update(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    let a = AssetRepo::create(&pool, &new_asset(p.id, "a")).await.unwrap();
    AssetRepo::create(&pool, &new_asset(p.id, "b")).await.unwrap();
    assert_eq!(a.status, "pending");
    assert_eq!(a.rating, 0);
    assert_eq!(a.mux_status, None);

    AssetRepo::update_status(&pool, a.id, "selected").await.unwrap();
    let selected = AssetRepo::list_by_project(
        &pool,
        p.id,
        &AssetFilter {
            status: Some("selected".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(
        AssetRepo::count_by_status(&pool, p.id, "selected").await.unwrap(),
        1
    );
    assert_eq!(
        AssetRepo::count_in_category(&pool, p.id, "ceremony").await.unwrap(),
        2
    );

    let updated = AssetRepo::update(
        &pool,
        a.id,
        &UpdateAsset {
            rating: Some(4),
            tags: Some(vec!["hero".into()]),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.rating, 4);
    assert_eq!(updated.tags, vec!["hero"]);
    assert_eq!(updated.name, "a");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_assignee_and_cards(pool: PgPool) {
    let user = new_user(&pool, "Ed", "ed@example.com", "editor").await;
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    let a = AssetRepo::create(&pool, &new_asset(p.id, "a")).await.unwrap();

    let assigned = AssetRepo::set_assignee(&pool, a.id, Some(user), Some("assigned"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assigned.assigned_to, Some(user));
    assert_eq!(assigned.status, "assigned");

    let cards = AssetRepo::list_cards_assigned_to(&pool, user).await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].project_name, "P");

    let visible = AssetRepo::list_cards(&pool, Some(user)).await.unwrap();
    assert_eq!(visible.len(), 1);
    let all = AssetRepo::list_cards(&pool, None).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_versions_increment(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    let a = AssetRepo::create(&pool, &new_asset(p.id, "a")).await.unwrap();
    assert_eq!(a.current_version, 1);

    let input = CreateAssetVersion {
        url: "http://files/v2".into(),
        notes: Some("warmer grade".into()),
        storage_path: None,
        file_size_bytes: None,
    };
    let v2 = AssetVersionRepo::create_next(&pool, a.id, &input, None).await.unwrap();
    let v3 = AssetVersionRepo::create_next(&pool, a.id, &input, None).await.unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(v3.version, 3);

    let history = AssetVersionRepo::list_for_asset(&pool, a.id).await.unwrap();
    assert_eq!(history.iter().map(|v| v.version).collect::<Vec<_>>(), vec![3, 2]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mux_fields_round_trip(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    let a = AssetRepo::create(
        &pool,
        &CreateAsset {
            asset_type: "video".into(),
            mux_upload_id: Some("up_1".into()),
            ..new_asset(p.id, "clip")
        },
    )
    .await
    .unwrap();
    assert_eq!(a.mux_status.as_deref(), Some("waiting"));

    let found = AssetRepo::find_by_mux_upload_id(&pool, "up_1").await.unwrap().unwrap();
    assert_eq!(found.id, a.id);

    AssetRepo::apply_mux_update(
        &pool,
        a.id,
        &MuxAssetUpdate {
            mux_asset_id: Some("as_1".into()),
            mux_playback_id: Some("pb_1".into()),
            mux_status: "ready".into(),
            url: Some("https://stream.mux.com/pb_1.m3u8".into()),
            thumbnail: None,
        },
    )
    .await
    .unwrap();

    let ready = AssetRepo::find_by_mux_asset_id(&pool, "as_1").await.unwrap().unwrap();
    assert_eq!(ready.mux_status.as_deref(), Some("ready"));
    assert_eq!(ready.mux_playback_id.as_deref(), Some("pb_1"));
    assert_eq!(ready.url.as_deref(), Some("https://stream.mux.com/pb_1.m3u8"));
}

// ---------------------------------------------------------------------------
// Feedback and annotations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_feedback_lifecycle(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    let a = AssetRepo::create(&pool, &new_asset(p.id, "a")).await.unwrap();

    let fb = FeedbackRepo::create(
        &pool,
        &CreateFeedback {
            asset_id: a.id,
            text: "Crop tighter @maria".into(),
            author_name: "Client".into(),
            author_user_id: None,
            share_link_id: None,
            video_timestamp: Some(12.5),
            mentions: vec!["maria".into()],
        },
    )
    .await
    .unwrap();
    assert!(!fb.is_done);
    assert_eq!(fb.mentions, vec!["maria"]);

    let done = FeedbackRepo::update(
        &pool,
        fb.id,
        &UpdateFeedback {
            is_done: Some(true),
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap()
    .unwrap();
    assert!(done.is_done);
    assert_eq!(done.text, "Crop tighter @maria");

    assert_eq!(FeedbackRepo::list_for_project(&pool, p.id).await.unwrap().len(), 1);
    assert!(FeedbackRepo::delete(&pool, fb.id).await.unwrap());
    assert!(FeedbackRepo::list_for_asset(&pool, a.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_annotation_upsert_replaces_document(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    let a = AssetRepo::create(&pool, &new_asset(p.id, "a")).await.unwrap();

    assert!(AnnotationRepo::find_for_asset(&pool, a.id).await.unwrap().is_none());

    let first = serde_json::json!([{"id": "a1"}]);
    let second = serde_json::json!([{"id": "a1"}, {"id": "a2"}]);
    AnnotationRepo::upsert(&pool, a.id, &first, None).await.unwrap();
    let saved = AnnotationRepo::upsert(&pool, a.id, &second, None).await.unwrap();
    assert_eq!(saved.annotations, second);

    let loaded = AnnotationRepo::find_for_asset(&pool, a.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, saved.id);
    assert_eq!(loaded.annotations, second);
}

// ---------------------------------------------------------------------------
// Share links
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_share_link_token_unique_and_access_tracking(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    let input = CreateShareLink {
        link_type: "editor".into(),
        name: "Freelance editor".into(),
        expires_at: Some(Utc::now() + Duration::days(7)),
    };
    let link = ShareLinkRepo::create(&pool, p.id, "tok-1", &input, None).await.unwrap();
    assert!(link.is_active);
    assert_eq!(link.access_count, 0);

    let dup = ShareLinkRepo::create(&pool, p.id, "tok-1", &input, None).await;
    let err = dup.unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.constraint()),
        Some("uq_share_links_token")
    );

    ShareLinkRepo::record_access(&pool, link.id).await.unwrap();
    ShareLinkRepo::record_access(&pool, link.id).await.unwrap();
    let reloaded = ShareLinkRepo::find_by_id(&pool, link.id).await.unwrap().unwrap();
    assert_eq!(reloaded.access_count, 2);
    assert!(reloaded.last_accessed_at.is_some());

    let disabled = ShareLinkRepo::update(
        &pool,
        link.id,
        &UpdateShareLink {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert!(!disabled.is_active);
    assert_eq!(disabled.name, "Freelance editor");
}

// ---------------------------------------------------------------------------
// Activity and notifications
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_activity_newest_first(pool: PgPool) {
    let p = ProjectRepo::create(&pool, &new_project("P")).await.unwrap();
    for action in ["project.created", "asset.created"] {
        ActivityRepo::create(
            &pool,
            &CreateActivity {
                project_id: p.id,
                actor_user_id: None,
                actor_label: "system".into(),
                action: action.into(),
                details: serde_json::json!({}),
            },
        )
        .await
        .unwrap();
    }
    let entries = ActivityRepo::list_for_project(&pool, p.id, 10, 0).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "asset.created");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_notifications_read_flow(pool: PgPool) {
    let user = new_user(&pool, "Ed", "ed@example.com", "editor").await;
    for i in 0..3 {
        NotificationRepo::create(
            &pool,
            &CreateNotification {
                user_id: user,
                kind: "asset.assigned".into(),
                title: format!("n{i}"),
                body: String::new(),
                project_id: None,
                asset_id: None,
            },
        )
        .await
        .unwrap();
    }
    assert_eq!(NotificationRepo::unread_count(&pool, user).await.unwrap(), 3);

    let list = NotificationRepo::list_for_user(&pool, user, true, 10, 0).await.unwrap();
    assert!(NotificationRepo::mark_read(&pool, list[0].id, user).await.unwrap());
    assert!(!NotificationRepo::mark_read(&pool, list[0].id, user).await.unwrap());
    assert_eq!(NotificationRepo::unread_count(&pool, user).await.unwrap(), 2);

    assert_eq!(NotificationRepo::mark_all_read(&pool, user).await.unwrap(), 2);
    assert!(NotificationRepo::list_for_user(&pool, user, true, 10, 0)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_email_rejected(pool: PgPool) {
    new_user(&pool, "A", "same@example.com", "admin").await;
    let err = UserRepo::create(
        &pool,
        &CreateUser {
            name: "B".into(),
            email: "same@example.com".into(),
            password_hash: "x".into(),
            role: "editor".into(),
            is_core: false,
            is_freelancer: true,
            is_client: false,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.constraint()),
        Some("uq_users_email")
    );
    assert_eq!(UserRepo::count(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_sessions_are_single_use_and_pruned(pool: PgPool) {
    let user_id = new_user(&pool, "Sam", "sam@example.com", "editor").await;
    let session = |hash: &str, expires_at| CreateSession {
        user_id,
        refresh_token_hash: hash.to_string(),
        expires_at,
        user_agent: None,
        ip_address: None,
    };
    SessionRepo::create(&pool, &session("live", Utc::now() + Duration::days(7)))
        .await
        .unwrap();
    SessionRepo::create(&pool, &session("old", Utc::now() - Duration::days(1)))
        .await
        .unwrap();

    assert!(SessionRepo::consume_refresh_token(&pool, "old").await.unwrap().is_none());
    let consumed = SessionRepo::consume_refresh_token(&pool, "live").await.unwrap().unwrap();
    assert!(consumed.is_revoked);
    assert!(SessionRepo::consume_refresh_token(&pool, "live").await.unwrap().is_none());

    SessionRepo::create(&pool, &session("next", Utc::now() + Duration::days(7)))
        .await
        .unwrap();
    assert_eq!(SessionRepo::count_live_for_user(&pool, user_id).await.unwrap(), 1);
    assert_eq!(SessionRepo::delete_stale_for_user(&pool, user_id).await.unwrap(), 2);
    assert_eq!(SessionRepo::revoke_all_for_user(&pool, user_id).await.unwrap(), 1);
    assert_eq!(SessionRepo::count_live_for_user(&pool, user_id).await.unwrap(), 0);
}
