use tracing::debug;

use crate::model::ColumnId;

/// Where the placeholder currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub column: ColumnId,
    pub index: usize,
}

/// An in-progress card drag. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub card_id: String,
    pub origin: ColumnId,
    pub target: Option<DropTarget>,
}

impl DragSession {
    pub fn new(card_id: impl Into<String>, origin: ColumnId) -> Self {
        Self {
            card_id: card_id.into(),
            origin,
            target: None,
        }
    }
}

/// `Idle -> Dragging -> Idle`. At most one drag at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl DragState {
    /// Begin dragging `card_id`. Ignored while another drag is active.
    pub fn start(&mut self, card_id: impl Into<String>, origin: ColumnId) -> bool {
        if let Self::Dragging(active) = self {
            debug!(active = %active.card_id, "drag already in progress, ignoring start");
            return false;
        }
        *self = Self::Dragging(DragSession::new(card_id, origin));
        true
    }

    /// Move the placeholder. Returns the previous target, or `None` when idle
    /// or when there was none.
    pub fn update_target(&mut self, column: ColumnId, index: usize) -> Option<DropTarget> {
        match self {
            Self::Dragging(session) => session.target.replace(DropTarget { column, index }),
            Self::Idle => None,
        }
    }

    /// The pointer left `column`; forget the placeholder if it was there.
    pub fn clear_target(&mut self, column: ColumnId) -> bool {
        match self {
            Self::Dragging(session) if session.target.is_some_and(|t| t.column == column) => {
                session.target = None;
                true
            }
            _ => false,
        }
    }

    /// Finish the drag, whether dropped or cancelled.
    pub fn end(&mut self) -> Option<DragSession> {
        match std::mem::take(self) {
            Self::Dragging(session) => Some(session),
            Self::Idle => None,
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            Self::Dragging(session) => Some(session),
            Self::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging(_))
    }
}
