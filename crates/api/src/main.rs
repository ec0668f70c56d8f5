use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidshare_api::config::ServerConfig;
use vidshare_api::router::build_app_router;
use vidshare_api::state::AppState;
use vidshare_media::{CloudinaryConfig, CloudinaryHost};

type StartupError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server failed to start");
        std::process::exit(1);
    }
}

/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidshare_api=debug,vidshare_media=debug,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn run() -> Result<(), StartupError> {
    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = vidshare_db::create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection pool created");

    vidshare_db::health_check(&pool).await?;
    tracing::info!("Database health check passed");

    vidshare_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    // --- Media host ---
    let cloudinary = CloudinaryConfig::from_env()?;
    tracing::info!(cloud_name = %cloudinary.cloud_name, "Using Cloudinary media host");
    let media = Arc::new(CloudinaryHost::new(cloudinary));

    // --- App state ---
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    let state = AppState::new(pool, config.clone(), media);
    state.stager.ensure_dir().await?;
    tracing::info!(dir = %state.stager.dir().display(), "Upload staging directory ready");

    let app = build_app_router(state, &config);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
///
/// If a handler cannot be installed that signal is simply never observed;
/// the other one still stops the server.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
