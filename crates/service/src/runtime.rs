//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binaries prepare the upload tree via
//! `service::runtime` without depending directly on `common`.

/// Ensure the upload root and its document/export subdirectories exist.
pub async fn ensure_env(upload_root: &str) -> anyhow::Result<()> {
    common::env::ensure_upload_dirs(upload_root).await
}
