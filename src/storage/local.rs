use super::Storage;
use crate::{Error, Result, types::Format};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

pub struct LocalStorage {
    data_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn make_file_path(&self, id: &str, format: Format) -> Result<PathBuf> {
        // ids name files directly under data_dir
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(Error::InvalidInput(format!("invalid track id: {}", id)));
        }
        Ok(self.data_dir.join(format!("{}.{}", id, format.extension())))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, id: &str, format: Format) -> Result<bool> {
        let path = self.make_file_path(id, format)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn file_path(&self, id: &str, format: Format) -> Result<PathBuf> {
        self.make_file_path(id, format)
    }

    async fn index_path(&self, id: &str, format: Format) -> Result<Option<PathBuf>> {
        let path = self.make_file_path(id, format)?;
        if let Some(idx_ext) = format.index_extension() {
            // Try appended index first (e.g., file.bam.bai)
            let appended_idx = PathBuf::from(format!("{}.{}", path.display(), idx_ext));
            if fs::try_exists(&appended_idx).await.unwrap_or(false) {
                return Ok(Some(appended_idx));
            }

            // Try replaced extension (e.g., file.bai)
            let replaced_idx = path.with_extension(idx_ext);
            if fs::try_exists(&replaced_idx).await.unwrap_or(false) {
                return Ok(Some(replaced_idx));
            }
        }
        Ok(None)
    }
}
