use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{LanesError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub text: String,
}

impl Card {
    /// Create a card with a fresh id. The text is trimmed and must not be blank.
    pub fn new(text: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(LanesError::EmptyCardText);
        }
        Ok(Self {
            id: Ulid::new().to_string(),
            text: text.into(),
        })
    }

    /// Build a card with a known id, e.g. when restoring or in tests.
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}
