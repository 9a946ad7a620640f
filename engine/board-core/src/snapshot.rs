//! Textual board snapshots.
//!
//! Every board operation answers with the board as seen by one player:
//!
//! ```text
//! 2x2
//! my A
//! down
//! none
//! up B
//! ```
//!
//! The first line is `ROWSxCOLS`, followed by one line per cell in row-major
//! order. `my` marks face-up cards controlled by the viewer, `up` marks every
//! other face-up card.

use std::fmt;
use std::str::FromStr;

use crate::position::Position;

/// One cell as seen by a particular player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellView {
    None,
    Down,
    Up(String),
    Mine(String),
}

impl CellView {
    pub fn label(&self) -> Option<&str> {
        match self {
            CellView::Up(label) | CellView::Mine(label) => Some(label),
            CellView::None | CellView::Down => None,
        }
    }
}

impl fmt::Display for CellView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellView::None => f.write_str("none"),
            CellView::Down => f.write_str("down"),
            CellView::Up(label) => write!(f, "up {}", label),
            CellView::Mine(label) => write!(f, "my {}", label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Missing size header")]
    MissingHeader,
    #[error("Invalid size header: {0:?}")]
    BadHeader(String),
    #[error("Expected {expected} cells, got {actual}")]
    CellCount { expected: usize, actual: usize },
    #[error("Invalid cell on line {line}: {text:?}")]
    BadCell { line: usize, text: String },
}

/// A player's view of the whole board at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<CellView>,
}

impl Snapshot {
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellView> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(Position::new(row, col).index(self.cols))
    }

    /// Number of cells the viewer controls (0, 1 or 2).
    pub fn count_mine(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, CellView::Mine(_)))
            .count()
    }

    /// Number of cells that still hold a card.
    pub fn count_cards(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| !matches!(c, CellView::None))
            .count()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)?;
        for cell in &self.cells {
            write!(f, "\n{}", cell)?;
        }
        Ok(())
    }
}

impl FromStr for Snapshot {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        let header = lines.next().ok_or(SnapshotError::MissingHeader)?;
        let (rows, cols) =
            parse_dimensions(header).ok_or_else(|| SnapshotError::BadHeader(header.to_string()))?;

        let cells = lines
            .enumerate()
            .map(|(i, line)| {
                parse_cell(line).ok_or_else(|| SnapshotError::BadCell {
                    line: i + 2,
                    text: line.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if cells.len() != rows * cols {
            return Err(SnapshotError::CellCount {
                expected: rows * cols,
                actual: cells.len(),
            });
        }

        Ok(Self { rows, cols, cells })
    }
}

/// Parse a `ROWSxCOLS` header with both dimensions positive.
pub(crate) fn parse_dimensions(header: &str) -> Option<(usize, usize)> {
    let (rows, cols) = header.trim().split_once('x')?;
    let rows: usize = rows.parse().ok()?;
    let cols: usize = cols.parse().ok()?;
    (rows > 0 && cols > 0).then_some((rows, cols))
}

fn parse_cell(line: &str) -> Option<CellView> {
    match line {
        "none" => return Some(CellView::None),
        "down" => return Some(CellView::Down),
        _ => {}
    }
    let (kind, label) = line.split_once(' ')?;
    if label.is_empty() || label.contains(' ') {
        return None;
    }
    match kind {
        "up" => Some(CellView::Up(label.to_string())),
        "my" => Some(CellView::Mine(label.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            rows: 2,
            cols: 2,
            cells: vec![
                CellView::Mine("A".into()),
                CellView::Down,
                CellView::None,
                CellView::Up("B".into()),
            ],
        }
    }

    #[test]
    fn test_render_format() {
        assert_eq!(sample().to_string(), "2x2\nmy A\ndown\nnone\nup B");
    }

    #[test]
    fn test_parse_rendered_text() {
        let snap: Snapshot = "2x2\nmy A\ndown\nnone\nup B".parse().unwrap();
        assert_eq!(snap, sample());
        assert_eq!(snap.cell(1, 1), Some(&CellView::Up("B".into())));
        assert_eq!(snap.cell(2, 0), None);
        assert_eq!(snap.count_mine(), 1);
        assert_eq!(snap.count_cards(), 3);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!("".parse::<Snapshot>(), Err(SnapshotError::MissingHeader));
        assert_eq!(
            "2by2".parse::<Snapshot>(),
            Err(SnapshotError::BadHeader("2by2".into()))
        );
        assert_eq!(
            "1x2\ndown".parse::<Snapshot>(),
            Err(SnapshotError::CellCount {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            "1x1\nsideways A".parse::<Snapshot>(),
            Err(SnapshotError::BadCell {
                line: 2,
                text: "sideways A".into()
            })
        );
    }

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("3x4"), Some((3, 4)));
        assert_eq!(parse_dimensions(" 5x5 "), Some((5, 5)));
        assert_eq!(parse_dimensions("0x4"), None);
        assert_eq!(parse_dimensions("3x"), None);
        assert_eq!(parse_dimensions("-1x2"), None);
    }
}
