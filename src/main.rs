use std::sync::Arc;

use bookers::config::{Cli, Config, default_config_dir, default_config_path};
use bookers::db::Database;
use bookers::handler::AppState;
use bookers::routes::router;
use bookers::unpack_error;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("bookers.svc starting");

    // An explicit --config must load; its directory holds the database.
    // Without one, ~/.bookers/ is used and a missing file means defaults.
    let (cfg, data_dir) = match args.config_path {
        Some(path) => {
            let cfg = Config::new(&path).unwrap_or_else(|e| {
                tracing::error!(error = %unpack_error(&*e), path = %path, "failed to load config file");
                std::process::exit(1);
            });
            let dir = std::path::Path::new(&path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            (cfg, dir)
        }
        None => {
            let cfg = Config::new_or_default(&default_config_path()).unwrap_or_else(|e| {
                tracing::error!(error = %unpack_error(&*e), "failed to load config file");
                std::process::exit(1);
            });
            (cfg, default_config_dir())
        }
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(error = %e, path = ?data_dir, "failed to create data directory");
        std::process::exit(1);
    }

    let db = Database::new(&cfg, &data_dir).await.unwrap_or_else(|e| {
        tracing::error!(error = %unpack_error(&*e), "failed to setup database");
        std::process::exit(1);
    });

    let app = router(AppState::new(Arc::new(db)), cfg.app.cors_origin()).unwrap_or_else(|e| {
        tracing::error!(error = %unpack_error(&*e), "failed to build router");
        std::process::exit(1);
    });

    let address = cfg.app.address();
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("bookers.svc running on {}", &address);
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
    };

    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %err, "server exited with an error");
        std::process::exit(1);
    }

    tracing::info!("bookers.svc going off, graceful shutdown complete");
}
