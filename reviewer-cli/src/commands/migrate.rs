//! Migrate command - apply the schema to the configured database

use std::path::PathBuf;

use clap::Args;
use reviewer_core::config::CliOverrides;
use reviewer_core::Config;
use reviewer_db::{Database, DatabaseConfig};

/// Apply the database schema and exit
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Path to the SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,
}

impl MigrateArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            db_path: self.db.clone(),
            ..CliOverrides::default()
        }
    }

    /// Execute the migrate command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = &config.database.path;

        let db = Database::open(DatabaseConfig::from(&config.database))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to migrate {}: {}", path.display(), e))?;
        db.close().await;

        tracing::info!(path = %path.display(), "Schema applied");
        println!("Database ready at {}", path.display());

        Ok(())
    }
}
