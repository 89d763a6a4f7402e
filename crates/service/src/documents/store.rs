use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::ServiceError;

/// Where uploaded bytes live. Locators are relative paths under the store root.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, relative: &str, bytes: &[u8]) -> Result<String, ServiceError>;
    async fn exists(&self, locator: &str) -> bool;
    /// Delete a stored file. A locator that is already gone is not an error.
    async fn remove(&self, locator: &str) -> Result<(), ServiceError>;
    fn resolve(&self, locator: &str) -> Result<PathBuf, ServiceError>;
}

pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }
}

/// 仅允许普通路径段，拒绝 `..` 与绝对路径
fn checked_relative(locator: &str) -> Result<&Path, ServiceError> {
    let p = Path::new(locator);
    let ok = !locator.is_empty() && p.components().all(|c| matches!(c, Component::Normal(_)));
    if ok { Ok(p) } else { Err(ServiceError::Storage(format!("invalid locator: {locator}"))) }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, relative: &str, bytes: &[u8]) -> Result<String, ServiceError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        debug!(path = %path.display(), size = bytes.len(), "file_saved");
        Ok(relative.to_string())
    }

    async fn exists(&self, locator: &str) -> bool {
        match self.resolve(locator) {
            Ok(p) => tokio::fs::try_exists(p).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn remove(&self, locator: &str) -> Result<(), ServiceError> {
        let path = self.resolve(locator)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "file_removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::Storage(e.to_string())),
        }
    }

    fn resolve(&self, locator: &str) -> Result<PathBuf, ServiceError> {
        Ok(self.root.join(checked_relative(locator)?))
    }
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() { "file".to_string() } else { trimmed.to_string() }
}
