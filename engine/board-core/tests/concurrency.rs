//! Blocking, fairness and liveness of concurrent board operations.

use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

use board_core::{Board, BoardError, Snapshot};
use tokio::time::{sleep, timeout};

const SETTLE: Duration = Duration::from_millis(50);
const DEADLINE: Duration = Duration::from_secs(2);

fn shared_board() -> Arc<Board> {
    Arc::new(Board::new(2, 2, ["A", "B", "A", "B"]).unwrap())
}

fn spawn_flip(
    board: &Arc<Board>,
    player: &'static str,
    row: usize,
    col: usize,
) -> tokio::task::JoinHandle<Result<String, BoardError>> {
    let board = Arc::clone(board);
    tokio::spawn(async move { board.flip(player, row, col).await })
}

/// Poll `fut` exactly once from the current task.
async fn poll_once<F: Future + Unpin>(fut: &mut F) -> Poll<F::Output> {
    poll_fn(|cx| Poll::Ready(Pin::new(&mut *fut).poll(cx))).await
}

#[tokio::test]
async fn test_blocked_flip_resumes_after_relinquish() {
    let board = shared_board();
    board.flip("alice", 0, 0).await.unwrap();

    let bob = spawn_flip(&board, "bob", 0, 0);
    sleep(SETTLE).await;
    assert!(!bob.is_finished());

    // Non-matching second flip gives (0,0) up
    board.flip("alice", 0, 1).await.unwrap();

    let state = timeout(DEADLINE, bob).await.unwrap().unwrap().unwrap();
    let snap: Snapshot = state.parse().unwrap();
    assert_eq!(snap.cell(0, 0).unwrap().to_string(), "my A");
}

#[tokio::test]
async fn test_blocked_flip_fails_when_card_removed() {
    let board = shared_board();
    board.flip("alice", 0, 0).await.unwrap();
    board.flip("alice", 1, 0).await.unwrap();

    let bob = spawn_flip(&board, "bob", 0, 0);
    sleep(SETTLE).await;

    // Alice's next move removes the matched pair
    board.flip("alice", 0, 1).await.unwrap();

    let result = timeout(DEADLINE, bob).await.unwrap().unwrap();
    assert_eq!(result, Err(BoardError::NoCardHere));
}

#[tokio::test]
async fn test_every_waiter_on_removed_card_is_released() {
    let board = shared_board();
    board.flip("alice", 0, 0).await.unwrap();
    board.flip("alice", 1, 0).await.unwrap();

    let bob = spawn_flip(&board, "bob", 0, 0);
    let carol = spawn_flip(&board, "carol", 0, 0);
    let dave = spawn_flip(&board, "dave", 1, 0);
    sleep(SETTLE).await;

    board.flip("alice", 1, 1).await.unwrap();

    for waiter in [bob, carol, dave] {
        let result = timeout(DEADLINE, waiter).await.unwrap().unwrap();
        assert_eq!(result, Err(BoardError::NoCardHere));
    }
}

#[tokio::test]
async fn test_waiters_served_in_arrival_order() {
    let board = shared_board();
    board.flip("alice", 0, 0).await.unwrap();

    let bob = spawn_flip(&board, "bob", 0, 0);
    sleep(SETTLE).await;
    let carol = spawn_flip(&board, "carol", 0, 0);
    sleep(SETTLE).await;

    board.flip("alice", 0, 1).await.unwrap();
    timeout(DEADLINE, bob).await.unwrap().unwrap().unwrap();
    sleep(SETTLE).await;
    assert!(!carol.is_finished(), "carol must wait for bob");

    // Bob gives the card up with a mismatched second flip
    board.flip("bob", 1, 1).await.unwrap();

    let state = timeout(DEADLINE, carol).await.unwrap().unwrap().unwrap();
    assert_eq!(state.split('\n').nth(1), Some("my A"));
}

#[tokio::test]
async fn test_cancelled_waiter_does_not_strand_the_next() {
    let board = shared_board();
    board.flip("alice", 0, 0).await.unwrap();

    // Bob gives up waiting
    let gave_up = timeout(Duration::from_millis(20), board.flip("bob", 0, 0)).await;
    assert!(gave_up.is_err());

    let carol = spawn_flip(&board, "carol", 0, 0);
    sleep(SETTLE).await;

    board.flip("alice", 0, 1).await.unwrap();

    let state = timeout(DEADLINE, carol).await.unwrap().unwrap().unwrap();
    assert_eq!(state.split('\n').nth(1), Some("my A"));
}

#[tokio::test]
async fn test_waiter_dropped_after_wake_passes_it_on() {
    let board = shared_board();
    board.flip("alice", 0, 0).await.unwrap();

    let mut bob = Box::pin(board.flip("bob", 0, 0));
    assert!(poll_once(&mut bob).await.is_pending());
    let mut carol = Box::pin(board.flip("carol", 0, 0));
    assert!(poll_once(&mut carol).await.is_pending());

    // Bob is woken, then cancelled before he can take the card
    board.flip("alice", 0, 1).await.unwrap();
    drop(bob);

    let state = timeout(DEADLINE, carol).await.unwrap().unwrap();
    assert_eq!(state.split('\n').nth(1), Some("my A"));
}

#[tokio::test]
async fn test_woken_waiter_keeps_its_place_when_beaten_to_the_card() {
    let board = shared_board();
    board.flip("alice", 0, 0).await.unwrap();

    let mut bob = Box::pin(board.flip("bob", 0, 0));
    assert!(poll_once(&mut bob).await.is_pending());

    // Bob is woken but dave grabs the card before bob runs again
    board.flip("alice", 0, 1).await.unwrap();
    board.flip("dave", 0, 0).await.unwrap();

    let mut carol = Box::pin(board.flip("carol", 0, 0));
    assert!(poll_once(&mut carol).await.is_pending());
    assert!(poll_once(&mut bob).await.is_pending());

    // Dave gives the card up; bob was queued before carol
    board.flip("dave", 1, 1).await.unwrap();

    let state = timeout(DEADLINE, &mut bob).await.unwrap().unwrap();
    assert_eq!(state.split('\n').nth(1), Some("my A"));
    assert!(poll_once(&mut carol).await.is_pending());
}

#[tokio::test]
async fn test_watch_waits_for_a_change() {
    let board = shared_board();

    let idle = timeout(Duration::from_millis(50), board.watch("alice")).await;
    assert!(idle.is_err());

    let watcher = {
        let board = Arc::clone(&board);
        tokio::spawn(async move { board.watch("alice").await })
    };
    sleep(SETTLE).await;
    assert!(!watcher.is_finished());

    board.flip("bob", 1, 1).await.unwrap();

    let state = timeout(DEADLINE, watcher).await.unwrap().unwrap();
    assert_eq!(state, "2x2\ndown\ndown\ndown\nup B");
}

#[tokio::test]
async fn test_one_change_releases_all_watchers() {
    let board = shared_board();

    let watchers: Vec<_> = ["alice", "bob", "carol"]
        .into_iter()
        .map(|player| {
            let board = Arc::clone(&board);
            tokio::spawn(async move { board.watch(player).await })
        })
        .collect();
    sleep(SETTLE).await;

    board
        .map("dave", |card| async move { format!("{card}{card}") })
        .await
        .unwrap();

    for watcher in watchers {
        let state = timeout(DEADLINE, watcher).await.unwrap().unwrap();
        assert_eq!(state, "2x2\ndown\ndown\ndown\ndown");
    }
}

#[tokio::test]
async fn test_identity_map_does_not_wake_watchers() {
    let board = shared_board();
    let watcher = {
        let board = Arc::clone(&board);
        tokio::spawn(async move { board.watch("alice").await })
    };
    sleep(SETTLE).await;

    board.map("bob", |card| async move { card }).await.unwrap();
    sleep(SETTLE).await;
    assert!(!watcher.is_finished());

    board.flip("bob", 0, 0).await.unwrap();
    timeout(DEADLINE, watcher).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_slow_map_does_not_block_flips() {
    let board = shared_board();

    let mapper = {
        let board = Arc::clone(&board);
        tokio::spawn(async move {
            board
                .map("alice", |card| async move {
                    sleep(Duration::from_millis(100)).await;
                    card.to_lowercase()
                })
                .await
        })
    };
    sleep(SETTLE).await;

    // Runs while the transform is still pending
    let state = timeout(Duration::from_millis(40), board.flip("bob", 0, 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.split('\n').nth(1), Some("my A"));

    timeout(DEADLINE, mapper).await.unwrap().unwrap().unwrap();
    assert_eq!(board.look("bob").await.split('\n').nth(1), Some("my a"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_players_terminate() {
    let labels: Vec<String> = (0..16).map(|i| format!("C{}", i / 2)).collect();
    let board = Arc::new(Board::new(4, 4, labels).unwrap());

    let players: Vec<_> = (0..8)
        .map(|p| {
            let board = Arc::clone(&board);
            tokio::spawn(async move {
                let player = format!("p{p}");
                for step in 0..40usize {
                    let row = (p * 3 + step) % 4;
                    let col = (p + step * 7) % 4;
                    let flip = board.flip(&player, row, col);
                    let _ = timeout(Duration::from_millis(100), flip).await;
                }
            })
        })
        .collect();

    for player in players {
        timeout(Duration::from_secs(20), player)
            .await
            .unwrap()
            .unwrap();
    }

    let snap: Snapshot = board.look("observer").await.parse().unwrap();
    assert_eq!(snap.count_mine(), 0);
    assert!(snap.count_cards() <= 16);
}
