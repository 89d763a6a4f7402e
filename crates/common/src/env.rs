//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::info;

/// Create the upload root and the sub-directories written by documents and exports.
pub async fn ensure_upload_dirs(root: &str) -> anyhow::Result<()> {
    let root = Path::new(root);
    for sub in ["professional_documents", "exports"] {
        let dir = root.join(sub);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    }
    info!(root = %root.display(), "upload directories ready");
    Ok(())
}
