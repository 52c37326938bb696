
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use crate::db;

/// SQLite file in a temp dir, migrated; the dir lives as long as the returned guard.
pub(crate) async fn setup_test_db() -> anyhow::Result<(TempDir, DatabaseConnection)> {
    let dir = tempfile::tempdir()?;
    let mut cfg = configs::DatabaseConfig::default();
    cfg.url = format!("sqlite://{}?mode=rwc", dir.path().join("models.db").display());
    cfg.min_connections = 1;
    let conn = db::connect_with_config(&cfg).await?;
    db::migrate(&conn).await?;
    Ok((dir, conn))
}
