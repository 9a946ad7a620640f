//! Core types for the Memory Scramble game board
//!
//! This crate provides the shared, concurrency-safe board that many players
//! inspect and mutate at once:
//! - `Card`, `Position`, `Cell`: immutable values making up the grid
//! - `PlayerState`: per-player control and deferred-cleanup bookkeeping
//! - `Board`: the single-lock state machine behind `look`, `flip`, `map`, `watch`
//! - `Snapshot`: the textual board rendering returned by every operation
//! - `loader`: parsing of `ROWSxCOLS` board descriptions
//! - `commands`: a transport-agnostic request layer over the four operations

pub mod board;
pub mod card;
pub mod cell;
pub mod commands;
pub mod error;
pub mod loader;
pub mod player;
pub mod position;
pub mod snapshot;

// Re-export main types for convenience
pub use board::Board;
pub use card::Card;
pub use cell::{Cell, Face};
pub use commands::{Command, CommandError, Reply};
pub use error::BoardError;
pub use loader::ParseError;
pub use player::PlayerState;
pub use position::Position;
pub use snapshot::{CellView, Snapshot, SnapshotError};
