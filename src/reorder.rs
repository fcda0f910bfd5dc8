//! Pointer geometry to insertion index, and drop-time application of a move.
//!
//! The rule: among the cards of the target column (minus the dragged one),
//! find the first card whose vertical midpoint the pointer has not passed,
//! i.e. the card with the largest negative `pointer_y - midpoint`. The card
//! lands immediately before it, or at the end of the column when the pointer
//! is below every midpoint.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::ColumnId;
use crate::session::DragSession;
use crate::storage::Persistence;
use crate::store::BoardStore;

/// Rendered bounds of one card, sampled from the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardGeometry {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl CardGeometry {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// The card the pointer sits above, with its position among `geometry`.
///
/// `None` means the insertion point is the end of the column. Ties go to the
/// earliest card.
pub fn insertion_point<'a>(
    geometry: impl IntoIterator<Item = &'a CardGeometry>,
    pointer_y: f64,
) -> Option<(usize, &'a CardGeometry)> {
    let mut closest: Option<(usize, &'a CardGeometry)> = None;
    let mut closest_offset = f64::NEG_INFINITY;
    for (index, card) in geometry.into_iter().enumerate() {
        let offset = pointer_y - card.midpoint();
        if offset < 0.0 && offset > closest_offset {
            closest_offset = offset;
            closest = Some((index, card));
        }
    }
    closest
}

/// Zero-based insertion index among `geometry`.
pub fn insertion_index(geometry: &[CardGeometry], pointer_y: f64) -> usize {
    insertion_point(geometry, pointer_y).map_or(geometry.len(), |(index, _)| index)
}

/// Finish a drag by dropping the session's card into `target`.
///
/// The index is recomputed from `geometry` as sampled at drop time and
/// resolved against the target column with the dragged card already taken
/// out. Returns whether the board changed; a card that has left its origin
/// column is ignored.
pub fn apply_move<P: Persistence>(
    store: &mut BoardStore<P>,
    session: DragSession,
    target: ColumnId,
    pointer_y: f64,
    geometry: &[CardGeometry],
) -> Result<bool> {
    let dragged = session.card_id.as_str();
    let live = geometry.iter().filter(|g| g.id != dragged);
    let remaining: Vec<&str> = store
        .cards(target)
        .iter()
        .map(|c| c.id.as_str())
        .filter(|id| *id != dragged)
        .collect();

    let index = match insertion_point(live, pointer_y) {
        None => remaining.len(),
        Some((fallback, anchor)) => remaining
            .iter()
            .position(|id| *id == anchor.id)
            .unwrap_or_else(|| {
                tracing::debug!(anchor = %anchor.id, "geometry anchor not in column, using position");
                fallback.min(remaining.len())
            }),
    };

    store.move_card(dragged, session.origin, target, index)
}
