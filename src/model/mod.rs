mod board;
mod card;
mod column;
mod config;

pub use board::Board;
pub use card::Card;
pub use column::ColumnId;
pub use config::{DEFAULT_STORAGE_KEY, StoreConfig};
