//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the data directory exists and warn about store files that are not there yet.
pub async fn ensure_data_dir(data_dir: &Path, files: &[&Path]) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;
    for file in files {
        if tokio::fs::metadata(file).await.is_err() {
            warn!(path = %file.display(), "store file not found; starting with an empty collection");
        }
    }
    info!(data_dir = %data_dir.display(), "data directory ready");
    Ok(())
}
