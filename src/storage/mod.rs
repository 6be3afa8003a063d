//! Storage backend abstraction for track files.
//!
//! Handlers only see track ids; a [`Storage`] maps an id and [`Format`] to
//! the data file and, where the format has one, its index.
//!
//! # Implementations
//!
//! - [`LocalStorage`] - files under a local data directory
//!
//! # Example
//!
//! ```no_run
//! use tracksift::storage::LocalStorage;
//! use std::path::PathBuf;
//!
//! let storage = LocalStorage::new(PathBuf::from("./data"));
//! ```

mod local;

pub use local::LocalStorage;

use crate::{Error, Result, types::Format};
use async_trait::async_trait;
use std::path::PathBuf;

/// Data file of a track plus its index, if one was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFiles {
    pub data: PathBuf,
    pub index: Option<PathBuf>,
}

impl TrackFiles {
    /// Index path, or `NotFound` for formats that need one.
    pub fn require_index(&self) -> Result<&PathBuf> {
        self.index.as_ref().ok_or_else(|| {
            Error::NotFound(format!("index for {}", self.data.display()))
        })
    }
}

/// Storage backend trait for locating track files
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if a data file exists
    async fn exists(&self, id: &str, format: Format) -> Result<bool>;

    /// Path the data file for `id` lives at, whether or not it exists
    fn file_path(&self, id: &str, format: Format) -> Result<PathBuf>;

    /// Get index file path if available
    async fn index_path(&self, id: &str, format: Format) -> Result<Option<PathBuf>>;

    /// Data and index paths, or `NotFound` when the data file is missing.
    async fn locate(&self, id: &str, format: Format) -> Result<TrackFiles> {
        if !self.exists(id, format).await? {
            return Err(Error::NotFound(format!("{} track {}", format, id)));
        }
        Ok(TrackFiles {
            data: self.file_path(id, format)?,
            index: self.index_path(id, format).await?,
        })
    }
}
