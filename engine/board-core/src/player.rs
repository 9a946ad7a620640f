//! Per-player bookkeeping.

use crate::position::Position;

/// Most cells a player can leave behind for cleanup: one non-matching pair.
pub const MAX_PENDING: usize = 2;

/// What one player currently controls, and what their last move left behind.
///
/// A player with both `first` and `second` set holds a match; those cards are
/// removed at the start of the player's next flip. `pending` lists cells from a
/// failed or non-matching move that are turned back face down at that same
/// point, if nobody has taken them in the meantime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub first: Option<Position>,
    pub second: Option<Position>,
    pending: Vec<Position>,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_first(&self) -> bool {
        self.first.is_some()
    }

    /// Both cards of a matching pair are still held.
    pub fn holds_match(&self) -> bool {
        self.first.is_some() && self.second.is_some()
    }

    pub fn controls(&self, pos: Position) -> bool {
        self.first == Some(pos) || self.second == Some(pos)
    }

    pub fn pending(&self) -> &[Position] {
        &self.pending
    }

    /// Give up the first card, leaving it face up for later cleanup.
    pub(crate) fn relinquish_first(&mut self) -> Option<Position> {
        let first = self.first.take()?;
        self.push_pending(first);
        Some(first)
    }

    /// Give up a non-matching pair.
    pub(crate) fn relinquish_pair(&mut self, second: Position) -> Option<Position> {
        let first = self.relinquish_first()?;
        self.push_pending(second);
        Some(first)
    }

    /// Drop control of a matched pair that is being removed.
    pub(crate) fn release_match(&mut self) -> Option<(Position, Position)> {
        if !self.holds_match() {
            return None;
        }
        Some((self.first.take()?, self.second.take()?))
    }

    pub(crate) fn take_pending(&mut self) -> Vec<Position> {
        std::mem::take(&mut self.pending)
    }

    fn push_pending(&mut self, pos: Position) {
        self.pending.push(pos);
        debug_assert!(
            self.pending.len() <= MAX_PENDING,
            "pending list overflow: {:?}",
            self.pending
        );
    }
}
