//! Terminal front end for the game session core.
//!
//! A thin stdin command loop over a [`session::SessionHandle`]. All game state
//! lives in the session actor; this binary only parses commands, renders
//! snapshots, and holds two local view toggles (orientation, arrows).

mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use evaluation::HttpEvalClient;
use session::{spawn_session, SessionConfig, SessionEvent, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader};

use render::{render_evaluation, render_snapshot, ViewOptions};

/// Interactive chess game viewer with engine evaluation.
#[derive(Parser)]
#[command(name = "viewer-cli", about = "Chess game viewer with engine evaluation")]
struct Cli {
    /// Base URL of the engine evaluation service.
    #[arg(long, default_value = "http://localhost:5001")]
    engine_url: String,

    /// Seconds to wait for a single evaluation before giving up on it.
    #[arg(long, default_value_t = 5)]
    eval_timeout: u64,

    /// PGN file to load on startup.
    #[arg(long)]
    pgn: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(engine_url = %cli.engine_url, "starting viewer");

    let timeout = Duration::from_secs(cli.eval_timeout);
    let service = Arc::new(
        HttpEvalClient::new(&cli.engine_url, timeout)
            .context("failed to build engine service client")?,
    );
    let (handle, events) = spawn_session(service, SessionConfig { eval_timeout: timeout });

    // Late-arriving evaluations print a short notice instead of a full
    // redraw, so they never interleave with a board mid-print.
    tokio::spawn(watch_events(events));

    if let Some(path) = &cli.pgn {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match handle.load_pgn(text).await {
            Ok(snap) => println!("Loaded {} moves from {}", snap.history.len(), path.display()),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    let snap = handle.get_snapshot().await?;
    let mut opts = ViewOptions::default();
    print!("{}", render_snapshot(&snap, &opts));
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !run_command(line, &handle, &mut opts).await? {
            break;
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn watch_events(mut events: tokio::sync::broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::StateChanged(snap)) => {
                if snap.evaluation.is_some() {
                    print!("{}", render_evaluation(&snap));
                }
            }
            Ok(SessionEvent::EvaluationFailed(reason)) => {
                eprintln!("Evaluation failed: {}", reason);
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Execute one command line. Returns false when the loop should exit.
async fn run_command(
    line: &str,
    handle: &SessionHandle,
    opts: &mut ViewOptions,
) -> anyhow::Result<bool> {
    let (cmd, arg) = match line.split_once(' ') {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    let result = match cmd {
        "quit" | "exit" => return Ok(false),
        "help" => {
            print_help();
            return Ok(true);
        }
        "flip" => {
            opts.flipped = !opts.flipped;
            handle.get_snapshot().await
        }
        "arrows" => {
            opts.show_arrows = !opts.show_arrows;
            println!(
                "Best-move arrows {}.",
                if opts.show_arrows { "on" } else { "off" }
            );
            handle.get_snapshot().await
        }
        "show" => handle.get_snapshot().await,
        "move" => match chess::parse_coordinate_move(arg) {
            Ok((from, to, promotion)) => handle.make_move(from, to, promotion).await,
            Err(e) => Err(session::SessionError::IllegalMove(e.to_string())),
        },
        "select" | "click" => match chess::parse_square(arg) {
            Some(square) => handle.select_square(square).await.map(|(snap, _)| snap),
            None => Err(session::SessionError::IllegalMove(format!(
                "not a square: {arg}"
            ))),
        },
        "cancel" => handle.clear_selection().await,
        "undo" => handle.undo().await,
        "redo" => handle.redo().await,
        "reset" => handle.reset().await,
        "best" => handle.play_best_move().await,
        "load" => match std::fs::read_to_string(arg) {
            Ok(text) => handle.load_pgn(text).await,
            Err(e) => {
                eprintln!("Error: failed to read {}: {}", arg, e);
                return Ok(true);
            }
        },
        other => {
            eprintln!("Unknown command: {} (try 'help')", other);
            return Ok(true);
        }
    };

    match result {
        Ok(snap) => print!("{}", render_snapshot(&snap, opts)),
        Err(e) => eprintln!("Error: {}", e),
    }
    Ok(true)
}

fn print_help() {
    println!(
        "\
Commands:
  move <uci>     play a move in coordinate form (e2e4, e7e8q)
  select <sq>    click a square: select a piece, or move to a target
  cancel         clear the selection
  undo / redo    step through the move history
  reset          back to the starting position
  load <path>    load a PGN file
  best           play the engine's best move
  flip           flip board orientation
  arrows         toggle the best-move arrow
  show           redraw the current position
  quit           exit"
    );
}
