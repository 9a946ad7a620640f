//! Grid cells and card faces.

use crate::card::Card;

/// Which side of a card is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Down,
    Up,
}

/// One grid cell. A face exists only while a card does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Occupied { card: Card, face: Face },
}

impl Cell {
    /// A freshly dealt, face-down card.
    pub fn face_down(card: Card) -> Self {
        Cell::Occupied {
            card,
            face: Face::Down,
        }
    }

    pub fn card(&self) -> Option<&Card> {
        match self {
            Cell::Empty => None,
            Cell::Occupied { card, .. } => Some(card),
        }
    }

    pub fn face(&self) -> Option<Face> {
        match self {
            Cell::Empty => None,
            Cell::Occupied { face, .. } => Some(*face),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_face_up(&self) -> bool {
        self.face() == Some(Face::Up)
    }

    /// Turn the card over. Returns true if the face actually changed.
    pub(crate) fn set_face(&mut self, to: Face) -> bool {
        match self {
            Cell::Occupied { face, .. } if *face != to => {
                *face = to;
                true
            }
            _ => false,
        }
    }

    /// Take the card off the board.
    pub(crate) fn remove(&mut self) -> Option<Card> {
        match std::mem::replace(self, Cell::Empty) {
            Cell::Empty => None,
            Cell::Occupied { card, .. } => Some(card),
        }
    }

    /// Swap the card for one with a different label, keeping its face.
    /// Returns true if the label changed.
    pub(crate) fn relabel(&mut self, to: &Card) -> bool {
        match self {
            Cell::Occupied { card, .. } if card != to => {
                *card = to.clone();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_only_with_card() {
        let mut cell = Cell::face_down(Card::new("A").unwrap());
        assert_eq!(cell.face(), Some(Face::Down));

        assert!(cell.set_face(Face::Up));
        assert!(!cell.set_face(Face::Up));
        assert!(cell.is_face_up());

        assert_eq!(cell.remove(), Some(Card::new("A").unwrap()));
        assert_eq!(cell.face(), None);
        assert!(!cell.set_face(Face::Down));
    }

    #[test]
    fn test_relabel_keeps_face() {
        let mut cell = Cell::face_down(Card::new("A").unwrap());
        cell.set_face(Face::Up);
        assert!(cell.relabel(&Card::new("C").unwrap()));
        assert!(!cell.relabel(&Card::new("C").unwrap()));
        assert_eq!(cell.card().map(Card::label), Some("C"));
        assert!(cell.is_face_up());
    }
}
