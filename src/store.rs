use tracing::{debug, error, warn};

use crate::error::Result;
use crate::model::{Board, Card, ColumnId, StoreConfig};
use crate::storage::Persistence;

/// Columns touched by a mutation, each listed once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Affected(Vec<ColumnId>);

impl Affected {
    pub fn one(column: ColumnId) -> Self {
        Self(vec![column])
    }

    /// Origin first, then target. A same-column move yields one entry.
    pub fn pair(from: ColumnId, to: ColumnId) -> Self {
        if from == to {
            Self::one(from)
        } else {
            Self(vec![from, to])
        }
    }

    pub fn all() -> Self {
        Self(ColumnId::ALL.to_vec())
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.0
    }

    pub fn contains(&self, column: ColumnId) -> bool {
        self.0.contains(&column)
    }
}

type Observer = Box<dyn FnMut(&Affected)>;

/// Owns the board and writes it through to storage after every change.
pub struct BoardStore<P: Persistence> {
    board: Board,
    storage: P,
    key: String,
    observers: Vec<Observer>,
}

impl<P: Persistence> BoardStore<P> {
    /// Load the board saved under the configured key.
    ///
    /// Unreadable or malformed data never fails startup: the store starts
    /// from an empty board instead.
    pub fn open(storage: P, config: &StoreConfig) -> Self {
        let key = config.storage_key.clone();
        let board = match storage.read(&key) {
            Ok(Some(data)) => Board::from_json(&data).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "discarding saved board");
                Board::default()
            }),
            Ok(None) => {
                debug!(key = %key, "no saved board, starting empty");
                Board::default()
            }
            Err(e) => {
                warn!(key = %key, error = %e, "could not read saved board");
                Board::default()
            }
        };
        Self {
            board,
            storage,
            key,
            observers: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cards(&self, column: ColumnId) -> &[Card] {
        self.board.cards(column)
    }

    pub fn snapshot(&self) -> Board {
        self.board.clone()
    }

    pub fn storage(&self) -> &P {
        &self.storage
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Register a callback run after every change with the affected columns.
    pub fn subscribe(&mut self, observer: impl FnMut(&Affected) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Insert `card` at `index`, clamped to the column length.
    ///
    /// Returns the index used, or `None` if a card with the same id is
    /// already on the board.
    pub fn insert(&mut self, column: ColumnId, index: usize, card: Card) -> Result<Option<usize>> {
        if self.board.contains(&card.id) {
            warn!(card_id = %card.id, "refusing to insert a card that is already on the board");
            return Ok(None);
        }
        let cards = self.board.cards_mut(column);
        let at = index.min(cards.len());
        if at != index {
            debug!(requested = index, clamped = at, column = %column, "insertion index clamped");
        }
        cards.insert(at, card);
        self.commit(Affected::one(column))?;
        Ok(Some(at))
    }

    /// Remove the first card with `card_id` from `column`. Absent cards are
    /// a no-op.
    pub fn remove_by_id(&mut self, column: ColumnId, card_id: &str) -> Result<Option<Card>> {
        let cards = self.board.cards_mut(column);
        let Some(pos) = cards.iter().position(|c| c.id == card_id) else {
            return Ok(None);
        };
        let card = cards.remove(pos);
        self.commit(Affected::one(column))?;
        Ok(Some(card))
    }

    /// Move a card between (or within) columns.
    ///
    /// `to_index` addresses the target list after the card has been taken
    /// out of `from`, and is clamped. A card that is not in `from` makes this
    /// a no-op; returns whether anything moved.
    pub fn move_card(
        &mut self,
        card_id: &str,
        from: ColumnId,
        to: ColumnId,
        to_index: usize,
    ) -> Result<bool> {
        let source = self.board.cards_mut(from);
        let Some(pos) = source.iter().position(|c| c.id == card_id) else {
            debug!(card_id, from = %from, "stale move ignored");
            return Ok(false);
        };
        let card = source.remove(pos);
        let target = self.board.cards_mut(to);
        let at = to_index.min(target.len());
        target.insert(at, card);
        debug!(card_id, from = %from, to = %to, index = at, "card moved");
        self.commit(Affected::pair(from, to))?;
        Ok(true)
    }

    /// Create a card from user text and append it to `column`.
    pub fn add_card(&mut self, column: ColumnId, text: &str) -> Result<Card> {
        let card = Card::new(text)?;
        self.board.cards_mut(column).push(card.clone());
        self.commit(Affected::one(column))?;
        Ok(card)
    }

    pub fn delete_card(&mut self, column: ColumnId, card_id: &str) -> Result<bool> {
        Ok(self.remove_by_id(column, card_id)?.is_some())
    }

    /// Replace the whole board from a serialized blob.
    ///
    /// Malformed data resets the board to empty and returns `MalformedData`.
    pub fn restore(&mut self, data: &str) -> Result<()> {
        match Board::from_json(data) {
            Ok(board) => {
                self.board = board;
                self.commit(Affected::all())
            }
            Err(e) => {
                warn!(error = %e, "restore failed, resetting to an empty board");
                self.board = Board::default();
                self.commit(Affected::all())?;
                Err(e)
            }
        }
    }

    // Persist first; observers run even when the write failed so the view
    // still matches memory.
    fn commit(&mut self, affected: Affected) -> Result<()> {
        let saved = self.persist();
        if let Err(e) = &saved {
            error!(key = %self.key, error = %e, "failed to persist board");
        }
        for observer in &mut self.observers {
            observer(&affected);
        }
        saved
    }

    fn persist(&mut self) -> Result<()> {
        let blob = self.board.to_json()?;
        self.storage.write(&self.key, &blob)
    }
}
