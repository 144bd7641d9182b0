//! # Tic-tac-toe Simulation Client
//!
//! Opens pairs of connections against a running server and lets each pair
//! play a full game of random legal moves over the line protocol. Useful as a
//! smoke test and as a small load generator.

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::seq::SliceRandom;
use std::time::Duration;
use tictac_server::game::{Board, BoardStatus, RoomId, Symbol};
use tictac_server::messaging::{read_server_message, ClientMessage, MoveRequest, ServerMessage};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const MAX_LINE: usize = 1024;

#[derive(Parser, Debug, Clone)]
#[command(name = "simulate")]
#[command(about = "Plays random tic-tac-toe games against a tictac server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:9001")]
    addr: String,

    /// Number of games to play concurrently
    #[arg(short, long, default_value = "1")]
    games: u32,

    /// Pause before each move, in milliseconds
    #[arg(short, long, default_value = "200")]
    move_delay_ms: u64,
}

/// How a game ended from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameResult {
    Won(Symbol),
    Draw,
    /// The server sent `exit` before the board reached a result
    Abandoned,
}

#[derive(Debug)]
struct Report {
    player: usize,
    room: Option<RoomId>,
    symbol: Option<Symbol>,
    result: GameResult,
}

/// Picks a uniformly random empty cell.
fn pick_cell(board: &Board) -> Option<(usize, usize)> {
    board.empty_cells().choose(&mut rand::thread_rng()).copied()
}

fn my_turn(board: &Board, symbol: Symbol) -> bool {
    // X always opens, so X moves whenever an even number of cells is taken.
    (board.occupied() % 2 == 0) == (symbol == Symbol::X)
}

async fn send_move(
    writer: &mut OwnedWriteHalf,
    board: &Board,
    symbol: Symbol,
    delay: Duration,
) -> Result<()> {
    sleep(delay).await;
    let Some((row, col)) = pick_cell(board) else {
        return Ok(());
    };
    let message = ClientMessage::Move(MoveRequest { symbol, row, col });
    writer
        .write_all(message.encode().as_bytes())
        .await
        .context("sending move")?;
    Ok(())
}

async fn play(player: usize, addr: String, delay: Duration) -> Result<Report> {
    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("connecting to {addr}"))?;
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut room = None;
    let mut symbol = None;
    let mut board = Board::new();
    let mut result = None;

    loop {
        let message = read_server_message(&mut reader, MAX_LINE)
            .await
            .with_context(|| format!("player {player} reading from server"))?;
        let Some(message) = message else {
            bail!("player {player}: server closed the connection without exit");
        };
        debug!("Player {} received {:?}", player, message);

        match message {
            ServerMessage::RoomAssigned(id) => {
                info!("🏠 Player {} joined room {}", player, id);
                room = Some(id);
            }
            ServerMessage::Seated(seat) => {
                info!("🪑 Player {} plays {}", player, seat);
                symbol = Some(seat);
                if my_turn(&board, seat) {
                    send_move(&mut writer, &board, seat, delay).await?;
                }
            }
            ServerMessage::Board(next) => {
                board = next;
                match board.status() {
                    BoardStatus::InProgress => {
                        if let Some(seat) = symbol.filter(|&s| my_turn(&board, s)) {
                            send_move(&mut writer, &board, seat, delay).await?;
                        }
                    }
                    status => {
                        result = Some(match status {
                            BoardStatus::Won(winner) => GameResult::Won(winner),
                            _ => GameResult::Draw,
                        });
                        // One side closes the room; the server then sends exit to both.
                        if symbol == Some(Symbol::O) {
                            writer
                                .write_all(ClientMessage::Exit.encode().as_bytes())
                                .await
                                .context("sending exit")?;
                        }
                    }
                }
            }
            ServerMessage::Rejected(reason) => {
                warn!("⚠️ Player {} move rejected: {}", player, reason);
                if let Some(seat) = symbol.filter(|&s| my_turn(&board, s)) {
                    send_move(&mut writer, &board, seat, delay).await?;
                }
            }
            ServerMessage::Exit => break,
        }
    }

    let _ = writer.shutdown().await;
    Ok(Report {
        player,
        room,
        symbol,
        result: result.unwrap_or(GameResult::Abandoned),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let delay = Duration::from_millis(args.move_delay_ms);

    info!("🚀 Starting tic-tac-toe simulation");
    info!("   • Server: {}", args.addr);
    info!("   • Games: {}", args.games);
    info!("   • Move delay: {}ms", args.move_delay_ms);

    let mut handles = Vec::new();
    for player in 0..(args.games as usize * 2) {
        let addr = args.addr.clone();
        handles.push(tokio::spawn(play(player, addr, delay)));
        // Connect one at a time so consecutive players share a room
        sleep(Duration::from_millis(50)).await;
    }

    let (mut x_wins, mut o_wins, mut draws, mut abandoned, mut failures) = (0, 0, 0, 0, 0);
    for handle in handles {
        match handle.await.context("player task panicked")? {
            Ok(report) => {
                info!(
                    "🏁 Player {} (room {:?}, {:?}): {:?}",
                    report.player, report.room, report.symbol, report.result
                );
                // Count each game once, from the O seat
                if report.symbol != Some(Symbol::X) {
                    match report.result {
                        GameResult::Won(Symbol::X) => x_wins += 1,
                        GameResult::Won(Symbol::O) => o_wins += 1,
                        GameResult::Draw => draws += 1,
                        GameResult::Abandoned => abandoned += 1,
                    }
                }
            }
            Err(e) => {
                error!("❌ {:#}", e);
                failures += 1;
            }
        }
    }

    info!("✅ Simulation complete");
    info!("   • X wins: {}", x_wins);
    info!("   • O wins: {}", o_wins);
    info!("   • Draws: {}", draws);
    info!("   • Abandoned: {}", abandoned);
    if failures > 0 {
        bail!("{failures} player(s) failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_follows_the_number_of_occupied_cells() {
        let mut board = Board::new();
        assert!(my_turn(&board, Symbol::X));
        assert!(!my_turn(&board, Symbol::O));

        board.place(1, 1, Symbol::X).expect("legal");
        assert!(my_turn(&board, Symbol::O));
        assert!(!my_turn(&board, Symbol::X));
    }

    #[test]
    fn picks_only_empty_cells() {
        let board: Board = "X,O,X\nO,X,O\nO,X, ".parse().expect("board");
        assert_eq!(pick_cell(&board), Some((2, 2)));

        let full: Board = "X,O,X\nO,X,O\nO,X,O".parse().expect("board");
        assert_eq!(pick_cell(&full), None);
    }
}
