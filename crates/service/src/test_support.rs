#![cfg(test)]
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use models::db::{connect_with_config, migrate};

/// A migrated SQLite database living in its own temp dir.
pub struct TestDb {
    pub db: DatabaseConnection,
    _dir: TempDir,
}

pub async fn get_db() -> Result<TestDb, anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let mut cfg = configs::DatabaseConfig::default();
    cfg.url = format!("sqlite://{}?mode=rwc", dir.path().join("service.db").display());
    cfg.min_connections = 1;
    let db = connect_with_config(&cfg).await?;
    migrate(&db).await?;
    Ok(TestDb { db, _dir: dir })
}
