use std::collections::HashMap;

use super::Persistence;
use crate::error::Result;

/// In-process storage, for headless use and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: HashMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob, as if a previous session had saved it.
    pub fn with_blob(key: impl Into<String>, blob: impl Into<String>) -> Self {
        let mut blobs = HashMap::new();
        blobs.insert(key.into(), blob.into());
        Self { blobs, writes: 0 }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.blobs.get(key).map(String::as_str)
    }

    /// Number of writes performed so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Persistence for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<()> {
        self.blobs.insert(key.into(), blob.into());
        self.writes += 1;
        Ok(())
    }
}
