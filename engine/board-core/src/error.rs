//! Errors raised by board operations.

/// Failure of a single board operation.
///
/// None of these leave the board in an inconsistent state. `NoCardHere` and
/// `AlreadyControlled` on a second flip still relinquish the player's first
/// card, so callers should look at the board again rather than retry blindly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Invalid position: ({row}, {col})")]
    InvalidPosition { row: usize, col: usize },

    #[error("No card at this position")]
    NoCardHere,

    #[error("Card is already controlled")]
    AlreadyControlled,

    #[error("Invalid card label: {0:?}")]
    InvalidLabel(String),
}

impl BoardError {
    /// Whether this error came from the flip rules (as opposed to bad input).
    pub fn is_rule_violation(&self) -> bool {
        matches!(self, BoardError::NoCardHere | BoardError::AlreadyControlled)
    }
}
