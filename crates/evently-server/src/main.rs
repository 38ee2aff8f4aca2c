mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use evently_api::mailer::LogMailer;
use evently_api::payments::{FreeEventsGateway, HttpPaymentGateway, PaymentGateway};
use evently_api::uploads::UploadDir;
use evently_api::{AppState, AppStateInner};
use evently_crypto::TextCipher;
use evently_db::{Database, DocStore};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evently=debug,evently_api=debug,evently_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    let cipher = TextCipher::from_secret(&config.encryption_secret)
        .context("EVENTLY_ENCRYPTION_SECRET is not usable")?;

    // Init storage
    let db = Database::open(&config.db_path)?;
    let docs = DocStore::open(&config.docs_db_path)?;

    let payments: Arc<dyn PaymentGateway> = match &config.payment_url {
        Some(url) => {
            info!("Payments via {}", url);
            Arc::new(HttpPaymentGateway::new(url.clone())?)
        }
        None => {
            warn!("EVENTLY_PAYMENT_URL unset; only free events can be checked out");
            Arc::new(FreeEventsGateway)
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        docs,
        jwt_secret: config.jwt_secret.clone(),
        cipher,
        uploads: UploadDir::new(config.uploads_dir()),
        mailer: Arc::new(LogMailer),
        payments,
        public_dir: config.public_dir.clone(),
        public_url: config.public_url.clone(),
        admin_email: config.admin_email.clone(),
    });

    let app = evently_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Evently listening on {}", addr);
    info!("Serving static files from {}", config.public_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
