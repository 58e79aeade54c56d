use award_image_uploads::config::UploadConfig;
use award_image_uploads::infrastructure::storage;
use award_image_uploads::services::remote::RemoteCapability;
use award_image_uploads::services::sweeper::StagingSweeper;
use award_image_uploads::{AppState, create_app};
use clap::Parser;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the API server
    #[arg(short, long, default_value_t = 4567)]
    port: u16,

    /// Never register the remote image store, even when S3 is configured
    #[arg(long)]
    local_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "award_image_uploads=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting award image uploads...");

    // 2. Directories
    let config = UploadConfig::from_env();
    storage::prepare_directories(&config).await?;
    info!(
        "🛡️  Upload Config: Max Size={}MB, Remote Timeout={:?}, Strict Staging Cleanup={}",
        config.max_file_size / 1024 / 1024,
        config.remote_timeout,
        config.strict_staging_cleanup
    );

    // 3. Remote capability
    let remote = Arc::new(RemoteCapability::new());
    if args.local_only {
        info!("💾 Local-only mode: remote image store disabled");
    } else if let Some(store) = storage::setup_remote_store().await {
        remote.register(store);
    } else {
        info!("💾 No remote image store configured, storing images locally");
    }

    // 4. Staging sweeper
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sweeper = StagingSweeper::new(
        config.staging_dir.clone(),
        config.staging_cleanup_age_hours,
        shutdown_rx,
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    // 5. API server
    let state = AppState::new(config, remote);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://0.0.0.0:{}", args.port);
    info!("📖 Swagger UI documentation: http://localhost:{}/swagger-ui", args.port);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Server runtime error: {}", e);
    }

    info!("🛑 Shutting down backend services...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_handle.await {
        warn!("Staging sweeper ended abnormally: {}", e);
    }

    info!("👋 Exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
