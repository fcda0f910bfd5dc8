//! Three-column kanban board state with drag-and-drop reordering.
//!
//! [`BoardStore`] owns the cards and writes them through a [`Persistence`]
//! backend after every change. [`reorder`] turns a pointer position and the
//! rendered card bounds into an insertion index, and [`BoardController`]
//! feeds abstract [`InputEvent`]s through a [`DragState`] into the store,
//! re-rendering only the columns that changed.

pub mod controller;
pub mod error;
pub mod model;
pub mod reorder;
pub mod session;
pub mod storage;
pub mod store;

pub use controller::{BoardController, BoardView, InputEvent};
pub use error::{LanesError, Result};
pub use model::{Board, Card, ColumnId, StoreConfig};
pub use reorder::{CardGeometry, apply_move, insertion_index};
pub use session::{DragSession, DragState, DropTarget};
pub use storage::{FileStorage, MemoryStorage, Persistence};
pub use store::{Affected, BoardStore};
