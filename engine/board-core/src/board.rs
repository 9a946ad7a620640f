//! The shared game board.
//!
//! All board state sits behind one mutex. Critical sections never await, so a
//! plain `std::sync::Mutex` is enough; callers that must wait do so on a
//! `oneshot` channel after the guard has been dropped, then lock again and
//! re-check from the top.
//!
//! Two kinds of waiting exist:
//! - a first flip on a card another player controls joins that cell's FIFO
//!   queue and is woken alone when the card is relinquished or removed
//! - `watch` registers a one-shot listener; every version bump wakes all of them

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::card::Card;
use crate::cell::{Cell, Face};
use crate::error::BoardError;
use crate::loader::{self, BoardSpec, ParseError};
use crate::player::PlayerState;
use crate::position::Position;
use crate::snapshot::{CellView, Snapshot};

/// A Memory Scramble board shared by any number of concurrent players.
///
/// Players are identified by string ids and registered on first use. Every
/// operation answers with the board rendered from the caller's point of view
/// (see [`Snapshot`]).
#[derive(Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    state: Mutex<BoardState>,
}

#[derive(Debug)]
struct BoardState {
    cols: usize,
    /// Row-major grid
    cells: Vec<Cell>,
    players: HashMap<String, PlayerState>,
    /// Callers blocked on a first flip, per contested cell
    waiters: HashMap<Position, VecDeque<oneshot::Sender<()>>>,
    /// Callers blocked in `watch`
    listeners: Vec<oneshot::Sender<()>>,
    /// Bumped on every observable change
    version: u64,
}

/// Result of one pass through the flip rules.
enum Flip {
    Done,
    Wait(oneshot::Receiver<()>),
}

/// Where a blocked first flip joins the cell's wait queue.
#[derive(Clone, Copy)]
enum Queue {
    Back,
    Front,
}

/// A first flip parked on a contested cell.
///
/// If the flip is dropped after being woken but before it could act on the
/// wake, the wake is handed to the next caller queued on the same cell.
struct Waiting<'a> {
    board: &'a Board,
    pos: Position,
    rx: oneshot::Receiver<()>,
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        if self.rx.try_recv().is_ok() {
            trace!(pos = %self.pos, "woken waiter dropped, passing the wake on");
            self.board.lock().wake_one(self.pos);
        }
    }
}

impl Board {
    /// Create a board from explicit dimensions and row-major labels.
    pub fn new<I, S>(rows: usize, cols: usize, labels: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BoardSpec::new(rows, cols, labels).map(Self::from_spec)
    }

    pub fn from_spec(spec: BoardSpec) -> Self {
        let BoardSpec { rows, cols, cards } = spec;
        Self {
            rows,
            cols,
            state: Mutex::new(BoardState {
                cols,
                cells: cards.into_iter().map(Cell::face_down).collect(),
                players: HashMap::new(),
                waiters: HashMap::new(),
                listeners: Vec::new(),
                version: 0,
            }),
        }
    }

    /// Build a board from a `ROWSxCOLS` description.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        loader::parse(text).map(Self::from_spec)
    }

    /// Read a board description from disk.
    pub async fn parse_from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        loader::parse_file(path).await.map(Self::from_spec)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of observable changes so far.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Short human-readable summary, e.g. `Board(3x3, 9 cards)`.
    pub fn describe(&self) -> String {
        let cards = self.lock().cells.iter().filter(|c| !c.is_empty()).count();
        format!("Board({}x{}, {} cards)", self.rows, self.cols, cards)
    }

    /// Look at the board without changing it.
    pub async fn look(&self, player: &str) -> String {
        let mut state = self.lock();
        state.ensure_player(player);
        state.render(player)
    }

    /// Flip the card at (`row`, `col`) for `player`.
    ///
    /// Cleans up the player's previous move first. A first flip on a card held
    /// by someone else waits until that card is given up, then tries again.
    pub async fn flip(&self, player: &str, row: usize, col: usize) -> Result<String, BoardError> {
        let pos = self.position(row, col)?;

        let rx = {
            let mut state = self.lock();
            state.ensure_player(player);
            state.finish_previous_move(player);
            match state.flip(player, pos, Queue::Back)? {
                Flip::Done => return Ok(state.render(player)),
                Flip::Wait(rx) => rx,
            }
        };
        let mut waiting = Waiting {
            board: self,
            pos,
            rx,
        };

        loop {
            debug!(player, %pos, "waiting for card");
            // An error only means the waker went away; re-check either way
            let _ = (&mut waiting.rx).await;

            // Already waited once, so keep our place at the head of the queue
            waiting.rx = {
                let mut state = self.lock();
                match state.flip(player, pos, Queue::Front)? {
                    Flip::Done => return Ok(state.render(player)),
                    Flip::Wait(rx) => rx,
                }
            };
        }
    }

    /// Replace every card label `l` with `f(l)`.
    ///
    /// `f` runs once per distinct label with the board unlocked, so a slow
    /// transform does not stall other players. The replacements are applied in
    /// one critical section afterwards, so cards that shared a label still
    /// share one.
    pub async fn map<F, Fut>(&self, player: &str, mut f: F) -> Result<String, BoardError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = String>,
    {
        let labels = {
            let mut state = self.lock();
            state.ensure_player(player);
            state.distinct_cards()
        };

        let mut replacements = HashMap::with_capacity(labels.len());
        for card in labels {
            let replacement = Card::new(f(card.label().to_string()).await)?;
            replacements.insert(card, replacement);
        }

        let mut state = self.lock();
        let relabelled = state.relabel(&replacements);
        if relabelled > 0 {
            debug!(player, relabelled, "map replaced card labels");
            state.changed();
        }
        Ok(state.render(player))
    }

    /// Wait for the next change to the board, then look at it.
    pub async fn watch(&self, player: &str) -> String {
        let changed = {
            let mut state = self.lock();
            state.ensure_player(player);
            state.listeners.retain(|tx| !tx.is_closed());
            let (tx, rx) = oneshot::channel();
            state.listeners.push(tx);
            rx
        };

        let _ = changed.await;
        self.lock().render(player)
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        // Critical sections cannot panic half-way through a mutation, so a
        // poisoned lock still guards consistent state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn position(&self, row: usize, col: usize) -> Result<Position, BoardError> {
        if row < self.rows && col < self.cols {
            Ok(Position::new(row, col))
        } else {
            Err(BoardError::InvalidPosition { row, col })
        }
    }

    #[cfg(test)]
    pub(crate) fn check_rep(&self) {
        self.lock().check_rep();
    }
}

impl BoardState {
    fn ensure_player(&mut self, player: &str) {
        if !self.players.contains_key(player) {
            trace!(player, "registering player");
            self.players.insert(player.to_owned(), PlayerState::new());
        }
    }

    fn player_mut(&mut self, player: &str) -> &mut PlayerState {
        self.players.entry(player.to_owned()).or_default()
    }

    fn cell(&self, pos: Position) -> &Cell {
        &self.cells[pos.index(self.cols)]
    }

    fn cell_mut(&mut self, pos: Position) -> &mut Cell {
        &mut self.cells[pos.index(self.cols)]
    }

    /// The player controlling `pos`, found by scanning every player.
    fn controller(&self, pos: Position) -> Option<&str> {
        self.players
            .iter()
            .find(|(_, state)| state.controls(pos))
            .map(|(id, _)| id.as_str())
    }

    fn flip(&mut self, player: &str, pos: Position, queue: Queue) -> Result<Flip, BoardError> {
        match self.player_mut(player).first {
            Some(first) => self.flip_second(player, first, pos).map(|()| Flip::Done),
            None => self.flip_first(player, pos, queue),
        }
    }

    fn flip_first(
        &mut self,
        player: &str,
        pos: Position,
        queue: Queue,
    ) -> Result<Flip, BoardError> {
        if self.cell(pos).is_empty() {
            // Pass the turn on so nobody queued behind a removed card is stranded
            self.wake_one(pos);
            return Err(BoardError::NoCardHere);
        }

        let contested = self
            .controller(pos)
            .is_some_and(|owner| owner != player);
        if contested {
            let (tx, rx) = oneshot::channel();
            let waiters = self.waiters.entry(pos).or_default();
            waiters.retain(|tx| !tx.is_closed());
            match queue {
                Queue::Back => waiters.push_back(tx),
                Queue::Front => waiters.push_front(tx),
            }
            return Ok(Flip::Wait(rx));
        }

        self.cell_mut(pos).set_face(Face::Up);
        self.player_mut(player).first = Some(pos);
        debug!(player, %pos, "flipped first card");
        self.changed();
        Ok(Flip::Done)
    }

    fn flip_second(
        &mut self,
        player: &str,
        first: Position,
        pos: Position,
    ) -> Result<(), BoardError> {
        if self.cell(pos).is_empty() {
            self.give_up_first(player);
            return Err(BoardError::NoCardHere);
        }
        if self.controller(pos).is_some() {
            self.give_up_first(player);
            return Err(BoardError::AlreadyControlled);
        }

        self.cell_mut(pos).set_face(Face::Up);

        if self.cell(first).card() == self.cell(pos).card() {
            self.player_mut(player).second = Some(pos);
            debug!(player, %first, second = %pos, "matched a pair");
        } else {
            self.player_mut(player).relinquish_pair(pos);
            self.wake_one(first);
            self.wake_one(pos);
            debug!(player, %first, second = %pos, "cards did not match");
        }

        self.changed();
        Ok(())
    }

    /// Relinquish the first card after a failed second flip.
    fn give_up_first(&mut self, player: &str) {
        if let Some(first) = self.player_mut(player).relinquish_first() {
            self.wake_one(first);
        }
        self.changed();
    }

    /// Deferred cleanup of the player's previous move: remove a held match,
    /// then turn leftover face-up cards back down unless someone took them.
    fn finish_previous_move(&mut self, player: &str) {
        if let Some((first, second)) = self.player_mut(player).release_match() {
            for pos in [first, second] {
                self.cell_mut(pos).remove();
                self.wake_one(pos);
            }
            debug!(player, %first, %second, "removed matched pair");
            self.changed();
        }

        for pos in self.player_mut(player).take_pending() {
            if self.cell(pos).is_face_up() && self.controller(pos).is_none() {
                self.cell_mut(pos).set_face(Face::Down);
                trace!(player, %pos, "turned card face down");
                self.changed();
            }
        }
    }

    /// Wake the longest-waiting caller still interested in `pos`.
    fn wake_one(&mut self, pos: Position) {
        let Some(queue) = self.waiters.get_mut(&pos) else {
            return;
        };
        while let Some(tx) = queue.pop_front() {
            if tx.send(()).is_ok() {
                trace!(%pos, remaining = queue.len(), "woke waiter");
                break;
            }
        }
        if queue.is_empty() {
            self.waiters.remove(&pos);
        }
    }

    /// Record an observable change and wake every watcher.
    fn changed(&mut self) {
        self.version += 1;
        for tx in self.listeners.drain(..) {
            let _ = tx.send(());
        }

        #[cfg(debug_assertions)]
        self.check_rep();
    }

    /// Distinct cards on the board, in row-major order of first appearance.
    fn distinct_cards(&self) -> Vec<Card> {
        let mut seen = HashSet::new();
        self.cells
            .iter()
            .filter_map(Cell::card)
            .filter(|card| seen.insert(*card))
            .cloned()
            .collect()
    }

    /// Apply label replacements; returns how many cells changed.
    fn relabel(&mut self, replacements: &HashMap<Card, Card>) -> usize {
        let mut relabelled = 0;
        for cell in &mut self.cells {
            // Labels that appeared since the transform ran are left alone
            let Some(to) = cell.card().and_then(|card| replacements.get(card)) else {
                continue;
            };
            if cell.relabel(to) {
                relabelled += 1;
            }
        }
        relabelled
    }

    fn snapshot(&self, player: &str) -> Snapshot {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(index, cell)| match cell {
                Cell::Empty => CellView::None,
                Cell::Occupied {
                    face: Face::Down, ..
                } => CellView::Down,
                Cell::Occupied {
                    card,
                    face: Face::Up,
                } => {
                    let pos = Position::from_index(index, self.cols);
                    let label = card.label().to_string();
                    if self.controller(pos) == Some(player) {
                        CellView::Mine(label)
                    } else {
                        CellView::Up(label)
                    }
                }
            })
            .collect();

        Snapshot {
            rows: self.cells.len() / self.cols,
            cols: self.cols,
            cells,
        }
    }

    fn render(&self, player: &str) -> String {
        self.snapshot(player).to_string()
    }

    /// Panics if a representation invariant is broken.
    #[cfg(any(test, debug_assertions))]
    fn check_rep(&self) {
        let mut owners: HashMap<Position, &str> = HashMap::new();
        for (id, player) in &self.players {
            assert!(
                player.pending().len() <= crate::player::MAX_PENDING,
                "{} has {} pending cells",
                id,
                player.pending().len()
            );
            assert!(
                player.second.is_none() || player.first.is_some(),
                "{} holds a second card without a first",
                id
            );
            for pos in [player.first, player.second].into_iter().flatten() {
                if let Some(other) = owners.insert(pos, id) {
                    panic!("{} controlled by both {} and {}", pos, other, id);
                }
                assert!(
                    self.cell(pos).is_face_up(),
                    "{} controls {} which is not a face-up card",
                    id,
                    pos
                );
            }
        }
    }
}
