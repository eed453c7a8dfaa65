use std::path::{Path, PathBuf};
use tokio::fs;

use crate::errors::{Error, Result};

/// Owns the destination root for uploads and makes sure it exists before anything is written.
#[derive(Debug, Clone)]
pub struct DestinationResolver {
    root: PathBuf,
}

impl DestinationResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and any missing ancestors. Repeated and concurrent calls are fine.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|source| Error::Io {
            operation: format!("create upload directory {}", self.root.display()),
            source,
        })?;
        tracing::trace!("Upload destination ready");
        Ok(())
    }

    /// Absolute location for a generated file name under the root.
    pub fn resolve(&self, generated_name: &str) -> PathBuf {
        let path = self.root.join(generated_name);
        std::path::absolute(&path).unwrap_or(path)
    }
}
