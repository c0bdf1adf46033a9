//! Serve command - run the HTTP API until interrupted

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use reviewer_api::AppState;
use reviewer_core::config::CliOverrides;
use reviewer_core::{Config, MemoryStore};
use reviewer_db::{Database, DatabaseConfig};
use tokio::net::TcpListener;

/// Run the HTTP server
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Path to the SQLite database file
    #[arg(long, conflicts_with = "memory")]
    db: Option<PathBuf>,

    /// Keep all state in memory instead of SQLite
    #[arg(long)]
    memory: bool,
}

impl ServeArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            host: self.host.clone(),
            port: self.port,
            db_path: self.db.clone(),
            log_level: None,
        }
    }

    /// Execute the serve command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let (state, db) = if self.memory {
            tracing::warn!("Using in-memory store; state is lost on exit");
            (AppState::from_store(Arc::new(MemoryStore::new())), None)
        } else {
            let db = Database::open(DatabaseConfig::from(&config.database))
                .await
                .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;
            tracing::info!(path = %config.database.path.display(), "Database ready");

            let state = AppState::new(
                Arc::new(db.teams()),
                Arc::new(db.users()),
                Arc::new(db.pull_requests()),
            );
            (state, Some(db))
        };

        let app = reviewer_api::router(state, config.server.request_timeout);
        let listener = TcpListener::bind(config.bind_address())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", config.bind_address(), e))?;

        reviewer_api::serve(
            listener,
            app,
            shutdown_signal(),
            config.server.shutdown_grace,
        )
        .await?;

        if let Some(db) = db {
            let grace = config.server.shutdown_grace;
            if tokio::time::timeout(grace, db.close()).await.is_err() {
                tracing::warn!(grace = ?grace, "Database did not close within grace period");
            } else {
                tracing::info!("Database closed");
            }
        }

        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
}
