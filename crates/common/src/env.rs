//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist and are usable at startup.

use std::path::Path;

use tracing::debug;

/// Create `dir` if missing and prove it is writable by creating and deleting
/// a probe file. Any failure is returned unchanged.
pub async fn ensure_writable_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let meta = tokio::fs::metadata(dir).await?;
    if !meta.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{} is not a directory", dir.display()),
        ));
    }
    let probe = dir.join(format!(".write-probe-{}", uuid::Uuid::new_v4()));
    tokio::fs::write(&probe, b"probe").await?;
    tokio::fs::remove_file(&probe).await?;
    debug!(dir = %dir.display(), "directory is writable");
    Ok(())
}
