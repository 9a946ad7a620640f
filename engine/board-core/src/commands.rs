//! Text commands over the four board operations.
//!
//! Any front end (an HTTP router, a REPL, a test driver) can turn a request
//! path into a [`Command`], run it against a shared [`Board`] and send back
//! the [`Reply`] as plain text. Supported forms:
//! - `look/<player>`
//! - `flip/<player>/<row>,<col>`
//! - `replace/<player>/<from>/<to>`
//! - `watch/<player>`

use std::str::FromStr;

use crate::board::Board;
use crate::card::Card;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid player id {0:?}: must be non-empty letters, digits or underscores")]
    InvalidPlayer(String),
    #[error("Invalid location {0:?}: expected <row>,<col>")]
    InvalidLocation(String),
    #[error("Invalid card label: {0:?}")]
    InvalidLabel(String),
}

/// One parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Look {
        player: String,
    },
    Flip {
        player: String,
        row: usize,
        col: usize,
    },
    Replace {
        player: String,
        from: String,
        to: String,
    },
    Watch {
        player: String,
    },
}

/// Outcome of running a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The board as seen by the requesting player
    Ok(String),
    /// The board refused the operation
    Rejected(String),
    /// The request itself was malformed
    BadRequest(String),
}

impl Reply {
    /// Equivalent HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            Reply::Ok(_) => 200,
            Reply::Rejected(_) => 409,
            Reply::BadRequest(_) => 400,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Reply::Ok(body) | Reply::Rejected(body) | Reply::BadRequest(body) => body,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::BadRequest(err.to_string())
    }
}

/// Player ids are non-empty ASCII letters, digits or underscores.
pub fn is_valid_player_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn player_id(raw: &str) -> Result<String, CommandError> {
    if is_valid_player_id(raw) {
        Ok(raw.to_string())
    } else {
        Err(CommandError::InvalidPlayer(raw.to_string()))
    }
}

fn location(raw: &str) -> Result<(usize, usize), CommandError> {
    let invalid = || CommandError::InvalidLocation(raw.to_string());
    let (row, col) = raw.split_once(',').ok_or_else(invalid)?;
    let row = row.trim().parse().map_err(|_| invalid())?;
    let col = col.trim().parse().map_err(|_| invalid())?;
    Ok((row, col))
}

fn label(raw: &str) -> Result<String, CommandError> {
    if Card::is_valid_label(raw) {
        Ok(raw.to_string())
    } else {
        Err(CommandError::InvalidLabel(raw.to_string()))
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('/').unwrap_or(s);
        if s.is_empty() {
            return Err(CommandError::Empty);
        }
        let parts: Vec<&str> = s.split('/').collect();

        match parts.as_slice() {
            ["look", player] => Ok(Command::Look {
                player: player_id(player)?,
            }),
            ["look", ..] => Err(CommandError::Usage("look/<player>")),
            ["flip", player, loc] => {
                let (row, col) = location(loc)?;
                Ok(Command::Flip {
                    player: player_id(player)?,
                    row,
                    col,
                })
            }
            ["flip", ..] => Err(CommandError::Usage("flip/<player>/<row>,<col>")),
            ["replace", player, from, to] => Ok(Command::Replace {
                player: player_id(player)?,
                from: label(from)?,
                to: label(to)?,
            }),
            ["replace", ..] => Err(CommandError::Usage("replace/<player>/<from>/<to>")),
            ["watch", player] => Ok(Command::Watch {
                player: player_id(player)?,
            }),
            ["watch", ..] => Err(CommandError::Usage("watch/<player>")),
            [op, ..] => Err(CommandError::UnknownOperation(op.to_string())),
            [] => Err(CommandError::Empty),
        }
    }
}

impl Command {
    pub fn player(&self) -> &str {
        match self {
            Command::Look { player }
            | Command::Flip { player, .. }
            | Command::Replace { player, .. }
            | Command::Watch { player } => player,
        }
    }

    /// Run the command against `board`. May wait (flip, watch).
    pub async fn execute(&self, board: &Board) -> Reply {
        match self {
            Command::Look { player } => Reply::Ok(board.look(player).await),
            Command::Flip { player, row, col } => match board.flip(player, *row, *col).await {
                Ok(state) => Reply::Ok(state),
                Err(e) if e.is_rule_violation() => {
                    Reply::Rejected(format!("cannot flip this card: {}", e))
                }
                Err(e) => Reply::BadRequest(e.to_string()),
            },
            Command::Replace { player, from, to } => {
                let result = board
                    .map(player, |card| async move {
                        if card == *from {
                            to.clone()
                        } else {
                            card
                        }
                    })
                    .await;
                match result {
                    Ok(state) => Reply::Ok(state),
                    Err(e) => Reply::Rejected(e.to_string()),
                }
            }
            Command::Watch { player } => Reply::Ok(board.watch(player).await),
        }
    }
}

/// Parse and run one command line.
pub async fn dispatch(board: &Board, request: &str) -> Reply {
    match request.parse::<Command>() {
        Ok(command) => command.execute(board).await,
        Err(e) => e.into(),
    }
}
