use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Card, ColumnId};
use crate::error::{LanesError, Result};

/// Ordered cards per column. This is exactly the persisted schema:
/// `{ "todo": [...], "in-progress": [...], "done": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Board {
    pub todo: Vec<Card>,
    #[serde(rename = "in-progress")]
    pub in_progress: Vec<Card>,
    pub done: Vec<Card>,
}

impl Board {
    pub fn cards(&self, column: ColumnId) -> &[Card] {
        match column {
            ColumnId::Todo => &self.todo,
            ColumnId::InProgress => &self.in_progress,
            ColumnId::Done => &self.done,
        }
    }

    pub(crate) fn cards_mut(&mut self, column: ColumnId) -> &mut Vec<Card> {
        match column {
            ColumnId::Todo => &mut self.todo,
            ColumnId::InProgress => &mut self.in_progress,
            ColumnId::Done => &mut self.done,
        }
    }

    /// Column and position of a card, if it is on the board.
    pub fn locate(&self, id: &str) -> Option<(ColumnId, usize)> {
        ColumnId::ALL.into_iter().find_map(|column| {
            self.cards(column)
                .iter()
                .position(|c| c.id == id)
                .map(|index| (column, index))
        })
    }

    pub fn find_card(&self, id: &str) -> Option<&Card> {
        self.locate(id)
            .map(|(column, index)| &self.cards(column)[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locate(id).is_some()
    }

    pub fn card_count(&self) -> usize {
        ColumnId::ALL.iter().map(|c| self.cards(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.card_count() == 0
    }

    /// Check that every card id is present once and every card has text.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in ColumnId::ALL {
            for card in self.cards(column) {
                if card.id.trim().is_empty() {
                    return Err(LanesError::MalformedData(format!(
                        "card with empty id in {column}"
                    )));
                }
                if card.text.trim().is_empty() {
                    return Err(LanesError::MalformedData(format!(
                        "card {} in {column} has no text",
                        card.id
                    )));
                }
                if !seen.insert(card.id.as_str()) {
                    return Err(LanesError::MalformedData(format!(
                        "duplicate card id {}",
                        card.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a persisted board.
    pub fn from_json(data: &str) -> Result<Self> {
        let board: Board =
            serde_json::from_str(data).map_err(|e| LanesError::MalformedData(e.to_string()))?;
        board.validate()?;
        Ok(board)
    }
}
