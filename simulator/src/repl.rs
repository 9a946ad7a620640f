//! Line-oriented command loop over a shared board.
//!
//! Each input line is one command in the `look/<player>`, `flip/<player>/<r>,<c>`,
//! `replace/<player>/<from>/<to>` or `watch/<player>` form. Commands run as
//! separate tasks, so a blocked `flip` or `watch` does not hold up later lines;
//! replies are printed as `<status> <body>` in the order they complete.

use anyhow::Result;
use board_core::commands::{dispatch, Reply};
use board_core::Board;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// How long commands still in flight get to finish once input ends.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn serve<R, W>(
    board: Arc<Board>,
    input: R,
    mut output: W,
    drain_timeout: Duration,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Reply>();
    let mut lines = input.lines();
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let request = line.trim();
                if request.is_empty() || request.starts_with('#') {
                    continue;
                }
                if matches!(request, "quit" | "exit") {
                    break;
                }

                debug!(request, "Dispatching command");
                let board = Arc::clone(&board);
                let request = request.to_string();
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let _ = tx.send(dispatch(&board, &request).await);
                });
            }
            Some(reply) = rx.recv() => write_reply(&mut output, &reply).await?,
        }
    }

    // Give commands still running a moment, then drop whatever is blocked
    drop(tx);
    let drained = tokio::time::timeout(drain_timeout, async {
        while in_flight.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        info!(
            abandoned = in_flight.len(),
            "Input closed with commands still waiting"
        );
        in_flight.shutdown().await;
    }

    while let Ok(reply) = rx.try_recv() {
        write_reply(&mut output, &reply).await?;
    }
    output.flush().await?;
    Ok(())
}

async fn write_reply<W: AsyncWrite + Unpin>(output: &mut W, reply: &Reply) -> Result<()> {
    let line = format!("{} {}\n", reply.status_code(), reply.body());
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
