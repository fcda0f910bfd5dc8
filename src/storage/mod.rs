mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;

/// Synchronous key/blob storage for the serialized board.
pub trait Persistence {
    /// Read the blob stored under `key`, or `None` if nothing was saved yet.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    fn write(&mut self, key: &str, blob: &str) -> Result<()>;
}
