use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use campus_rental_api::config::{self, AppConfig};
use campus_rental_api::db;
use campus_rental_api::events::{self, EventSender};
use campus_rental_api::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config()?;
    config::init_tracing(&config.log_level, config.log_json);
    info!(
        environment = %config.environment,
        "starting campus rental API"
    );

    let db = Arc::new(db::establish_connection_from_app_config(&config).await?);
    if config.auto_migrate {
        db::run_migrations(&db).await?;
    }
    db::check_connection(&db).await?;

    let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
    tokio::spawn(events::process_events(event_rx));
    let event_sender = Some(Arc::new(EventSender::new(event_tx)));

    let cors = build_cors(&config);
    let config = Arc::new(config);
    let state = AppState::new(db, config.clone(), event_sender);
    let app = app_router(state, cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn build_cors(config: &AppConfig) -> CorsLayer {
    if config.has_cors_allowed_origins() {
        let origins: Vec<HeaderValue> = config
            .cors_origins()
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("shutdown requested via ctrl-c"),
        _ = terminate => info!("shutdown requested via SIGTERM"),
    }
}
