use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::Persistence;
use crate::error::Result;
use crate::model::StoreConfig;

/// Stores each key as `<dir>/<key>.json`.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.resolved_data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Persistence for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.blob_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.blob_path(key), blob)?;
        Ok(())
    }
}
