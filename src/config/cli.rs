use crate::core::Storage;
use crate::utils::error::{EtlError, Result};
use std::path::{Path, PathBuf};

/// Reads and writes files under a base directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

fn storage_error(operation: &str, path: &Path, e: std::io::Error) -> EtlError {
    EtlError::StorageError {
        operation: operation.to_string(),
        location: path.display().to_string(),
        message: e.to_string(),
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        tokio::fs::read(&full_path)
            .await
            .map_err(|e| storage_error("read", &full_path, e))
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("write", &full_path, e))?;
        }

        tokio::fs::write(&full_path, data)
            .await
            .map_err(|e| storage_error("write", &full_path, e))
    }

    fn describe(&self, path: &str) -> String {
        self.full_path(path).display().to_string()
    }
}
