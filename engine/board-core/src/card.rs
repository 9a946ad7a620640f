//! Card values.

use std::fmt;

use crate::error::BoardError;

/// A card on the board, identified only by its label.
///
/// Labels are non-empty and contain no space, newline or carriage return, so
/// they can be embedded in one line of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card(String);

impl Card {
    pub fn new(label: impl Into<String>) -> Result<Self, BoardError> {
        let label = label.into();
        if !Self::is_valid_label(&label) {
            return Err(BoardError::InvalidLabel(label));
        }
        Ok(Self(label))
    }

    /// Wrap a label already checked with [`Card::is_valid_label`].
    pub(crate) fn from_valid(label: String) -> Self {
        debug_assert!(Self::is_valid_label(&label));
        Self(label)
    }

    /// Check a label without constructing a card.
    pub fn is_valid_label(label: &str) -> bool {
        !label.is_empty() && !label.contains([' ', '\n', '\r'])
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
