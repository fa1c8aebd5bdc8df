//! Reelhouse server entry point.

use std::sync::Arc;
use std::time::Duration;

use fred::interfaces::ClientLike;
use reelhouse_api::{AppState, MemorySessionStore, RedisSessionStore, SessionStore, app};
use reelhouse_common::{
    AppError, AppResult, Config,
    config::{SessionBackend, SessionConfig},
};
use reelhouse_core::{EventService, JobExecutor, run_scheduler};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer, limit::RequestBodyLimitLayer, services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body. Posters are URLs, so bodies stay small.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Background work driven by the scheduler.
struct Maintenance {
    events: EventService,
    sessions: Arc<dyn SessionStore>,
}

#[async_trait::async_trait]
impl JobExecutor for Maintenance {
    async fn conclude_expired_events(&self) -> AppResult<usize> {
        self.events.conclude_expired().await
    }

    async fn purge_expired_sessions(&self) -> AppResult<usize> {
        self.sessions.purge_expired().await
    }
}

async fn session_store(
    config: &SessionConfig,
) -> Result<Arc<dyn SessionStore>, Box<dyn std::error::Error>> {
    let ttl = Duration::from_secs(config.ttl_hours * 60 * 60);

    match config.backend {
        SessionBackend::Memory => {
            info!("Using in-memory session store");
            Ok(Arc::new(MemorySessionStore::new(ttl)))
        }
        SessionBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                AppError::Config("session.redis_url is required for the redis backend".to_string())
            })?;

            let fred_config = fred::types::config::Config::from_url(url)?;
            let client = fred::clients::Client::new(fred_config, None, None, None);
            client.connect();
            client.wait_for_connect().await?;
            info!("Connected to Redis session store");

            Ok(Arc::new(RedisSessionStore::new(
                Arc::new(client),
                config.prefix.clone(),
                ttl,
            )))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelhouse=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting reelhouse server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = reelhouse_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    reelhouse_db::migrate(&db).await?;
    info!("Migrations completed");

    let sessions = session_store(&config.session).await?;
    let state = AppState::new(Arc::new(db), Arc::clone(&sessions), &config.session);

    if let Some(bootstrap) = &config.bootstrap {
        if state.auth_service.ensure_super_admin(bootstrap).await? {
            info!(email = %bootstrap.email, "Created bootstrap super admin");
        }
    }

    let jobs = run_scheduler(
        &config.scheduler,
        Arc::new(Maintenance {
            events: state.event_service.clone(),
            sessions,
        }),
    );

    // Build router
    let app = app(state)
        .fallback_service(ServeDir::new(&config.server.static_dir))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for job in jobs {
        job.abort();
    }

    info!("Server shutdown complete");

    Ok(())
}
