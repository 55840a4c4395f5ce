mod clients;
mod config;
mod helpers;
mod models;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use clients::BackendClient;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<BackendClient>,
    pub config: Arc<config::Config>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slackwatch_console=info,tower_http=info".into()),
        )
        .init();

    let config_path = std::env::args()
        .skip(1)
        .zip(std::env::args().skip(2))
        .find_map(|(k, v)| (k == "-config" || k == "--config").then_some(v))
        .or_else(|| std::env::args().nth(1).filter(|a| !a.starts_with('-')))
        .unwrap_or_else(|| "/etc/slackwatch-console/config.yaml".to_string());

    let mut cfg = config::Config::load(&PathBuf::from(&config_path)).unwrap_or_else(|e| {
        eprintln!("error loading config: {}", e);
        std::process::exit(1);
    });
    cfg.apply_env(|k| std::env::var(k).ok());

    let base_url = cfg.resolve_base_url(|k| std::env::var(k).ok());
    let client = BackendClient::new(base_url).unwrap_or_else(|e| {
        eprintln!("failed to create HTTP client: {}", e);
        std::process::exit(1);
    });
    match client.base_url() {
        Some(url) => info!("using Slackwatch backend at {}", url),
        None => warn!("no Slackwatch backend configured, pages will render empty"),
    }

    let cfg = Arc::new(cfg);
    let state = AppState {
        client: Arc::new(client),
        config: cfg.clone(),
    };

    let router = routes::build_router(state);

    let listen_addr = cfg.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {}: {}", listen_addr, e);
        std::process::exit(1);
    });

    info!("slackwatch-console listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            eprintln!("server error: {}", e);
            std::process::exit(1);
        });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}
