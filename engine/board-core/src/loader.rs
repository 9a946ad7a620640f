//! Board description parsing.
//!
//! A board file starts with a `ROWSxCOLS` line followed by exactly
//! ROWS×COLS card labels, one per line:
//!
//! ```text
//! 2x2
//! A
//! B
//! A
//! B
//! ```

use std::path::{Path, PathBuf};

use crate::card::Card;
use crate::snapshot::parse_dimensions;

/// A malformed board description. No board is built when this is returned.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Empty board description")]
    Empty,

    #[error("First line must be ROWSxCOLS, got {0:?}")]
    BadHeader(String),

    #[error("Board must have positive dimensions, got {rows}x{cols}")]
    BadDimensions { rows: usize, cols: usize },

    #[error("Expected {expected} cards, got {actual}")]
    CardCount { expected: usize, actual: usize },

    #[error("Invalid card label on line {line}: {label:?}")]
    InvalidLabel { line: usize, label: String },

    #[error("Failed to read board file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The pieces needed to construct a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSpec {
    pub rows: usize,
    pub cols: usize,
    pub cards: Vec<Card>,
}

impl BoardSpec {
    /// Validate explicit dimensions and labels.
    pub fn new<I, S>(rows: usize, cols: usize, labels: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if rows == 0 || cols == 0 {
            return Err(ParseError::BadDimensions { rows, cols });
        }

        let cards = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let label: String = label.into();
                if !Card::is_valid_label(&label) {
                    // Line numbers as they would appear in a board file
                    return Err(ParseError::InvalidLabel { line: i + 2, label });
                }
                Ok(Card::from_valid(label))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if cards.len() != rows * cols {
            return Err(ParseError::CardCount {
                expected: rows * cols,
                actual: cards.len(),
            });
        }

        Ok(Self { rows, cols, cards })
    }
}

/// Parse a board description.
pub fn parse(text: &str) -> Result<BoardSpec, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut lines = text.lines().map(|line| line.trim_end_matches('\r'));
    let header = lines.next().ok_or(ParseError::Empty)?;
    let (rows, cols) =
        parse_dimensions(header).ok_or_else(|| ParseError::BadHeader(header.to_string()))?;

    BoardSpec::new(rows, cols, lines)
}

/// Read and parse a board file.
pub async fn parse_file(path: impl AsRef<Path>) -> Result<BoardSpec, ParseError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simple_board() {
        let spec = parse("2x2\nA\nB\nA\nB\n").unwrap();
        assert_eq!(spec.rows, 2);
        assert_eq!(spec.cols, 2);
        let labels: Vec<_> = spec.cards.iter().map(Card::label).collect();
        assert_eq!(labels, vec!["A", "B", "A", "B"]);
    }

    #[test]
    fn test_parse_handles_crlf() {
        let spec = parse("1x2\r\nA\r\nB\r\n").unwrap();
        assert_eq!(spec.cards.len(), 2);
        assert_eq!(spec.cards[1].label(), "B");
    }

    #[test]
    fn test_parse_rejects_wrong_card_count() {
        let err = parse("2x2\nA\nB\nA").unwrap_err();
        assert!(matches!(
            err,
            ParseError::CardCount {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        assert!(matches!(parse("two by two\nA"), Err(ParseError::BadHeader(_))));
        assert!(matches!(parse("0x2\n"), Err(ParseError::BadHeader(_))));
        assert!(matches!(parse("   \n"), Err(ParseError::Empty)));
    }

    #[test]
    fn test_parse_rejects_invalid_labels() {
        let err = parse("1x2\nA\nA B").unwrap_err();
        match err {
            ParseError::InvalidLabel { line, label } => {
                assert_eq!(line, 3);
                assert_eq!(label, "A B");
            }
            other => panic!("unexpected error: {}", other),
        }

        // A blank line in the middle is an empty label, not a skipped line
        assert!(matches!(
            parse("1x3\nA\n\nB"),
            Err(ParseError::InvalidLabel { line: 3, .. })
        ));
    }

    #[test]
    fn test_board_spec_rejects_zero_dimensions() {
        assert!(matches!(
            BoardSpec::new(0, 3, Vec::<String>::new()),
            Err(ParseError::BadDimensions { rows: 0, cols: 3 })
        ));
    }

    #[tokio::test]
    async fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "1x2\nX\nX\n").unwrap();

        let spec = parse_file(file.path()).await.unwrap();
        assert_eq!(spec.rows * spec.cols, 2);
    }

    #[tokio::test]
    async fn test_parse_missing_file() {
        let err = parse_file("/definitely/not/here.txt").await.unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
        assert!(err.to_string().contains("not/here.txt"));
    }
}
