use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_api::config::ServerConfig;
use studio_api::notifications::NotificationRouter;
use studio_api::router::build_app_router;
use studio_api::state::AppState;
use studio_events::{ActivityRecorder, EmailConfig, EventBus};
use studio_media::{LocalStorage, MuxClient, MuxConfig, StorageProvider, VideoPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "studio_api=debug,studio_events=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = studio_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    studio_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    studio_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Storage ---
    tokio::fs::create_dir_all(&config.storage.root_path)
        .await
        .with_context(|| format!("Failed to create {}", config.storage.root_path.display()))?;
    let storage: Arc<dyn StorageProvider> = Arc::new(LocalStorage::new(config.storage.clone()));
    tracing::info!(root = %config.storage.root_path.display(), "Local storage ready");

    // --- Mux ---
    let video: Option<Arc<dyn VideoPipeline>> = match MuxConfig::from_env() {
        Some(mux_config) => {
            tracing::info!("Mux video pipeline enabled");
            Some(Arc::new(MuxClient::new(mux_config).context("Failed to build Mux client")?))
        }
        None => {
            tracing::warn!("MUX_TOKEN_ID/MUX_TOKEN_SECRET not set, Mux routes will return 503");
            None
        }
    };

    // --- Email ---
    let email = match EmailConfig::from_env() {
        Some(email_config) => Some(
            email_config
                .build_sender()
                .context("Failed to build email sender")?,
        ),
        None => {
            tracing::warn!("Neither RESEND_API_KEY nor SMTP_HOST is set, email delivery disabled");
            None
        }
    };

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    tracing::info!("Event bus created");

    // Spawn the activity recorder (appends project events to the activity log).
    let recorder_handle = tokio::spawn(ActivityRecorder::run(pool.clone(), event_bus.subscribe()));

    // Spawn the notification router (in-app notifications + email).
    let notification_router = NotificationRouter::new(pool.clone(), email.clone());
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe()));

    tracing::info!("Event services started (activity recorder, notification router)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        storage,
        video,
        email,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // The router state held the other clones of the bus; dropping this last
    // sender closes the channel and lets the subscribers drain and exit.
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    drop(event_bus);
    let _ = tokio::time::timeout(drain, recorder_handle).await;
    let _ = tokio::time::timeout(drain, router_handle).await;
    tracing::info!("Event services shut down");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
