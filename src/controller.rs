use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::{LanesError, Result};
use crate::model::{Card, ColumnId};
use crate::reorder::{self, CardGeometry};
use crate::session::{DragState, DropTarget};
use crate::storage::Persistence;
use crate::store::BoardStore;

/// Rendering layer the controller draws into.
pub trait BoardView {
    /// Redraw one column from its current cards.
    fn render_column(&mut self, column: ColumnId, cards: &[Card]) -> Result<()>;

    /// Bounds of the cards currently laid out in `column`, in display order.
    fn column_geometry(&self, column: ColumnId) -> Vec<CardGeometry>;

    fn show_placeholder(&mut self, _column: ColumnId, _index: usize) {}

    fn clear_placeholder(&mut self, _column: ColumnId) {}

    fn set_composer_visible(&mut self, _column: ColumnId, _visible: bool) {}
}

/// Input events, independent of the input technology.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    CardDragStart { card_id: String },
    ColumnDragOver { column: ColumnId, pointer_y: f64 },
    ColumnDrop { column: ColumnId, pointer_y: f64 },
    ColumnDragLeave { column: ColumnId },
    CardDragEnd,
    AddCard { column: ColumnId, text: String },
    DeleteCard { column: ColumnId, card_id: String },
    ToggleComposer { column: ColumnId },
}

pub struct BoardController<P: Persistence, V: BoardView> {
    store: BoardStore<P>,
    view: V,
    drag: DragState,
    dirty: Rc<RefCell<Vec<ColumnId>>>,
    open_composers: HashSet<ColumnId>,
}

impl<P: Persistence, V: BoardView> BoardController<P, V> {
    /// Take ownership of the store and view and draw every column once.
    pub fn new(mut store: BoardStore<P>, view: V) -> Self {
        let dirty = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&dirty);
        store.subscribe(move |affected| {
            let mut pending = sink.borrow_mut();
            for column in affected.columns() {
                if !pending.contains(column) {
                    pending.push(*column);
                }
            }
        });

        let mut controller = Self {
            store,
            view,
            drag: DragState::default(),
            dirty,
            open_composers: HashSet::new(),
        };
        for column in ColumnId::ALL {
            controller.render(column);
        }
        controller
    }

    pub fn store(&self) -> &BoardStore<P> {
        &self.store
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn is_composer_visible(&self, column: ColumnId) -> bool {
        self.open_composers.contains(&column)
    }

    /// Dispatch one input event.
    ///
    /// Anomalies (stale ids, drops without a drag, blank card text) are
    /// ignored. The only errors returned are persistence failures; the
    /// affected columns are re-rendered either way.
    pub fn handle(&mut self, event: InputEvent) -> Result<()> {
        let result = match event {
            InputEvent::CardDragStart { card_id } => {
                self.drag_start(card_id);
                Ok(())
            }
            InputEvent::ColumnDragOver { column, pointer_y } => {
                self.drag_over(column, pointer_y);
                Ok(())
            }
            InputEvent::ColumnDrop { column, pointer_y } => self.drop_on(column, pointer_y),
            InputEvent::ColumnDragLeave { column } => {
                if self.drag.clear_target(column) {
                    self.view.clear_placeholder(column);
                }
                Ok(())
            }
            InputEvent::CardDragEnd => {
                self.drag_end();
                Ok(())
            }
            InputEvent::AddCard { column, text } => match self.store.add_card(column, &text) {
                Err(LanesError::EmptyCardText) => {
                    debug!(column = %column, "ignoring blank card");
                    Ok(())
                }
                other => other.map(|_| ()),
            },
            InputEvent::DeleteCard { column, card_id } => {
                self.store.delete_card(column, &card_id).map(|_| ())
            }
            InputEvent::ToggleComposer { column } => {
                let visible = if self.open_composers.remove(&column) {
                    false
                } else {
                    self.open_composers.insert(column)
                };
                self.view.set_composer_visible(column, visible);
                Ok(())
            }
        };
        self.flush_renders();
        result
    }

    fn drag_start(&mut self, card_id: String) {
        let Some((origin, _)) = self.store.board().locate(&card_id) else {
            debug!(card_id = %card_id, "drag started for a card not on the board");
            return;
        };
        self.drag.start(card_id, origin);
    }

    fn drag_over(&mut self, column: ColumnId, pointer_y: f64) {
        let Some(session) = self.drag.session() else {
            return;
        };
        let live: Vec<CardGeometry> = self
            .view
            .column_geometry(column)
            .into_iter()
            .filter(|g| g.id != session.card_id)
            .collect();
        let index = reorder::insertion_index(&live, pointer_y);

        let target = DropTarget { column, index };
        let previous = self.drag.update_target(column, index);
        if previous == Some(target) {
            return;
        }
        if let Some(previous) = previous
            && previous.column != column
        {
            self.view.clear_placeholder(previous.column);
        }
        self.view.show_placeholder(column, index);
    }

    fn drop_on(&mut self, column: ColumnId, pointer_y: f64) -> Result<()> {
        let Some(session) = self.drag.end() else {
            debug!(column = %column, "drop without an active drag");
            return Ok(());
        };
        if let Some(target) = session.target
            && target.column != column
        {
            self.view.clear_placeholder(target.column);
        }
        self.view.clear_placeholder(column);

        // Layout may have changed during the gesture; sample it now.
        let geometry = self.view.column_geometry(column);
        reorder::apply_move(&mut self.store, session, column, pointer_y, &geometry).map(|_| ())
    }

    fn drag_end(&mut self) {
        let Some(session) = self.drag.end() else {
            return;
        };
        debug!(card_id = %session.card_id, "drag cancelled");
        if let Some(target) = session.target {
            self.view.clear_placeholder(target.column);
        }
    }

    fn flush_renders(&mut self) {
        let pending: Vec<ColumnId> = self.dirty.borrow_mut().drain(..).collect();
        for column in pending {
            self.render(column);
        }
    }

    fn render(&mut self, column: ColumnId) {
        if let Err(e) = self.view.render_column(column, self.store.cards(column)) {
            warn!(column = %column, error = %e, "render failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::{Board, StoreConfig};
    use crate::storage::MemoryStorage;

    #[derive(Default)]
    struct RecordingView {
        rendered: HashMap<ColumnId, Vec<String>>,
        renders: Vec<ColumnId>,
        placeholder: Option<(ColumnId, usize)>,
        composers: HashMap<ColumnId, bool>,
        shift: f64,
        fail_renders: bool,
    }

    impl BoardView for RecordingView {
        fn render_column(&mut self, column: ColumnId, cards: &[Card]) -> Result<()> {
            self.renders.push(column);
            if self.fail_renders {
                return Err(LanesError::Render("canvas lost".into()));
            }
            self.rendered
                .insert(column, cards.iter().map(|c| c.id.clone()).collect());
            Ok(())
        }

        fn column_geometry(&self, column: ColumnId) -> Vec<CardGeometry> {
            self.rendered
                .get(&column)
                .map(|ids| {
                    ids.iter()
                        .enumerate()
                        .map(|(i, id)| {
                            CardGeometry::new(id.clone(), self.shift + 10.0 + 100.0 * i as f64, 80.0)
                        })
                        .collect()
                })
                .unwrap_or_default()
        }

        fn show_placeholder(&mut self, column: ColumnId, index: usize) {
            self.placeholder = Some((column, index));
        }

        fn clear_placeholder(&mut self, column: ColumnId) {
            if self.placeholder.is_some_and(|(c, _)| c == column) {
                self.placeholder = None;
            }
        }

        fn set_composer_visible(&mut self, column: ColumnId, visible: bool) {
            self.composers.insert(column, visible);
        }
    }

    fn controller_with(board: Board) -> BoardController<MemoryStorage, RecordingView> {
        controller_with_view(board, RecordingView::default())
    }

    fn controller_with_view(
        board: Board,
        view: RecordingView,
    ) -> BoardController<MemoryStorage, RecordingView> {
        let storage = MemoryStorage::with_blob("kanbanData", board.to_json().unwrap());
        let store = BoardStore::open(storage, &StoreConfig::default());
        BoardController::new(store, view)
    }

    fn abc() -> Board {
        Board {
            todo: vec![
                Card::with_id("A", "a"),
                Card::with_id("B", "b"),
                Card::with_id("C", "c"),
            ],
            ..Board::default()
        }
    }

    fn rendered(controller: &BoardController<MemoryStorage, RecordingView>, column: ColumnId) -> Vec<&str> {
        controller.view().rendered[&column]
            .iter()
            .map(String::as_str)
            .collect()
    }

    fn start(card_id: &str) -> InputEvent {
        InputEvent::CardDragStart {
            card_id: card_id.into(),
        }
    }

    fn over(column: ColumnId, pointer_y: f64) -> InputEvent {
        InputEvent::ColumnDragOver { column, pointer_y }
    }

    fn drop_on(column: ColumnId, pointer_y: f64) -> InputEvent {
        InputEvent::ColumnDrop { column, pointer_y }
    }

    #[test]
    fn new_renders_every_column() {
        let controller = controller_with(abc());
        assert_eq!(controller.view().renders, ColumnId::ALL);
        assert_eq!(rendered(&controller, ColumnId::Todo), ["A", "B", "C"]);
        assert!(rendered(&controller, ColumnId::Done).is_empty());
    }

    #[test]
    fn reorder_within_column() {
        let mut c = controller_with(abc());
        c.view_mut().renders.clear();

        c.handle(start("A")).unwrap();
        c.handle(over(ColumnId::Todo, 400.0)).unwrap();
        assert_eq!(c.view().placeholder, Some((ColumnId::Todo, 2)));

        c.handle(drop_on(ColumnId::Todo, 400.0)).unwrap();
        c.handle(InputEvent::CardDragEnd).unwrap();

        assert_eq!(rendered(&c, ColumnId::Todo), ["B", "C", "A"]);
        assert_eq!(c.view().renders, [ColumnId::Todo]);
        assert!(c.view().placeholder.is_none());
        assert!(!c.drag().is_dragging());
        assert_eq!(c.store().storage().writes(), 1);
    }

    #[test]
    fn move_across_columns_renders_origin_and_target() {
        let mut c = controller_with(abc());
        c.view_mut().renders.clear();

        c.handle(start("B")).unwrap();
        c.handle(over(ColumnId::Todo, 60.0)).unwrap();
        c.handle(InputEvent::ColumnDragLeave {
            column: ColumnId::Todo,
        })
        .unwrap();
        c.handle(over(ColumnId::Done, 0.0)).unwrap();
        assert_eq!(c.view().placeholder, Some((ColumnId::Done, 0)));
        c.handle(drop_on(ColumnId::Done, 0.0)).unwrap();

        assert_eq!(rendered(&c, ColumnId::Todo), ["A", "C"]);
        assert_eq!(rendered(&c, ColumnId::Done), ["B"]);
        assert_eq!(c.view().renders, [ColumnId::Todo, ColumnId::Done]);
        assert!(c.view().renders.iter().all(|col| *col != ColumnId::InProgress));
    }

    #[test]
    fn placeholder_follows_pointer_between_columns() {
        let mut c = controller_with(abc());
        c.handle(start("A")).unwrap();
        c.handle(over(ColumnId::Todo, 160.0)).unwrap();
        // A is excluded, so B and C are the only candidates; 160 is above C.
        assert_eq!(c.view().placeholder, Some((ColumnId::Todo, 1)));
        c.handle(over(ColumnId::InProgress, 5.0)).unwrap();
        assert_eq!(c.view().placeholder, Some((ColumnId::InProgress, 0)));
    }

    #[test]
    fn cancelled_drag_leaves_board_untouched() {
        let mut c = controller_with(abc());
        let before = c.store().snapshot();

        c.handle(start("A")).unwrap();
        c.handle(over(ColumnId::Done, 0.0)).unwrap();
        c.handle(InputEvent::CardDragEnd).unwrap();

        assert_eq!(c.store().snapshot(), before);
        assert_eq!(c.store().storage().writes(), 0);
        assert!(c.view().placeholder.is_none());
        assert!(!c.drag().is_dragging());
    }

    #[test]
    fn second_drag_start_is_ignored() {
        let mut c = controller_with(abc());
        c.handle(start("A")).unwrap();
        c.handle(start("B")).unwrap();
        assert_eq!(c.drag().session().unwrap().card_id, "A");
    }

    #[test]
    fn drag_of_unknown_card_is_ignored() {
        let mut c = controller_with(abc());
        c.handle(start("nope")).unwrap();
        assert!(!c.drag().is_dragging());
    }

    #[test]
    fn drop_without_drag_is_ignored() {
        let mut c = controller_with(abc());
        let before = c.store().snapshot();
        c.handle(drop_on(ColumnId::Done, 0.0)).unwrap();
        assert_eq!(c.store().snapshot(), before);
    }

    #[test]
    fn drop_uses_geometry_sampled_at_drop_time() {
        let mut c = controller_with(abc());
        c.handle(start("C")).unwrap();
        c.handle(over(ColumnId::Todo, 60.0)).unwrap();
        assert_eq!(c.view().placeholder, Some((ColumnId::Todo, 1)));

        // Something above the cards grew; every card is now 100px lower.
        c.view_mut().shift = 100.0;
        c.handle(drop_on(ColumnId::Todo, 60.0)).unwrap();

        assert_eq!(rendered(&c, ColumnId::Todo), ["C", "A", "B"]);
    }

    #[test]
    fn card_deleted_mid_drag_makes_drop_a_noop() {
        let mut c = controller_with(abc());
        c.handle(start("A")).unwrap();
        c.handle(InputEvent::DeleteCard {
            column: ColumnId::Todo,
            card_id: "A".into(),
        })
        .unwrap();
        c.handle(drop_on(ColumnId::Done, 0.0)).unwrap();

        let board = c.store().board();
        assert!(!board.contains("A"));
        assert!(board.done.is_empty());
        assert_eq!(board.card_count(), 2);
    }

    #[test]
    fn render_failure_does_not_skip_persistence() {
        let view = RecordingView {
            fail_renders: true,
            ..RecordingView::default()
        };
        let mut c = controller_with_view(abc(), view);
        c.handle(start("A")).unwrap();
        c.handle(drop_on(ColumnId::Done, 0.0)).unwrap();

        assert_eq!(c.store().storage().writes(), 1);
        let saved = Board::from_json(c.store().storage().get("kanbanData").unwrap()).unwrap();
        assert_eq!(saved.done[0].id, "A");
    }

    #[test]
    fn add_and_delete_cards() {
        let mut c = controller_with(Board::default());
        c.view_mut().renders.clear();

        c.handle(InputEvent::AddCard {
            column: ColumnId::InProgress,
            text: "  Review PR ".into(),
        })
        .unwrap();
        let card = c.store().cards(ColumnId::InProgress)[0].clone();
        assert_eq!(card.text, "Review PR");
        assert_eq!(rendered(&c, ColumnId::InProgress), [card.id.as_str()]);

        c.handle(InputEvent::DeleteCard {
            column: ColumnId::InProgress,
            card_id: card.id.clone(),
        })
        .unwrap();
        assert!(rendered(&c, ColumnId::InProgress).is_empty());
        assert_eq!(c.view().renders, [ColumnId::InProgress, ColumnId::InProgress]);
    }

    #[test]
    fn blank_card_is_ignored() {
        let mut c = controller_with(Board::default());
        c.handle(InputEvent::AddCard {
            column: ColumnId::Todo,
            text: "   ".into(),
        })
        .unwrap();
        assert!(c.store().board().is_empty());
        assert_eq!(c.store().storage().writes(), 0);
    }

    #[test]
    fn toggle_composer() {
        let mut c = controller_with(Board::default());
        assert!(!c.is_composer_visible(ColumnId::Done));

        c.handle(InputEvent::ToggleComposer {
            column: ColumnId::Done,
        })
        .unwrap();
        assert!(c.is_composer_visible(ColumnId::Done));
        assert!(c.view().composers[&ColumnId::Done]);

        c.handle(InputEvent::ToggleComposer {
            column: ColumnId::Done,
        })
        .unwrap();
        assert!(!c.is_composer_visible(ColumnId::Done));
        assert!(!c.view().composers[&ColumnId::Done]);
        assert!(!c.is_composer_visible(ColumnId::Todo));
    }
}
