/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::io::{self, BufRead, Write};

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use chessmatch::{Bitboard, ChessMatch, Color, MoveInput, BOARD_SIZE};

/// Play a game of chess in the terminal, one move per line (such as `e2e4` or `a7a8n`).
///
/// Enter a single square (such as `g1`) to see where the piece on it can go.
#[derive(Debug, Parser)]
struct Cli {
    /// The FEN string of the position to start from.
    #[arg(short, long)]
    fen: Option<String>,

    /// List of moves to apply to the position before play begins.
    #[arg(required = false)]
    moves: Vec<String>,

    /// If set, highlight every square the next player can move to after each move.
    #[arg(long, default_value = "false")]
    hints: bool,
}

/// Prints the board with `highlights` marked, White pieces in bold and Black pieces dimmed.
fn render(game: &ChessMatch, highlights: Bitboard) {
    let grid = highlights.to_grid();

    for (row, occupants) in game.snapshot().iter().enumerate() {
        print!("{} ", BOARD_SIZE - row);
        for (col, occupant) in occupants.iter().enumerate() {
            let cell = match occupant {
                Some(piece) if piece.color() == Color::White => piece.char().to_string().bold(),
                Some(piece) => piece.char().to_string().dimmed(),
                None => "-".normal(),
            };

            if grid[row][col] {
                print!("{} ", cell.on_blue());
            } else {
                print!("{cell} ");
            }
        }
        println!();
    }
    println!("  a b c d e f g h");

    let captured: String = game.captured_pieces().map(|piece| piece.char()).collect();
    if !captured.is_empty() {
        println!("Captured: {captured}");
    }
    println!("Turn: {}", game.turn());

    if let Some(winner) = game.winner() {
        println!("{}", "CHECKMATE!".red().bold());
        println!("Winner: {winner}");
    } else {
        println!("Waiting player: {}", game.current_player());
        if game.check() {
            println!("{}", "CHECK!".red());
        }
    }
}

/// Applies a move, including its promotion choice, to `game`.
fn apply(game: &mut ChessMatch, input: &MoveInput) -> anyhow::Result<()> {
    game.perform_move_at(input.from, input.to)?;

    if let Some(kind) = input.promotion {
        game.select_promotion(kind)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();

    let mut game = if let Some(fen) = &args.fen {
        ChessMatch::from_fen(fen)?
    } else {
        ChessMatch::default()
    };

    // Apply moves, if any were provided
    for mv_str in &args.moves {
        let input = MoveInput::from_uci(mv_str)?;
        apply(&mut game, &input)?;
    }

    render(&game, Bitboard::default());

    let stdin = io::stdin();
    loop {
        if game.checkmate() {
            break;
        }

        print!("\n{} > ", game.current_player());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => continue,
            "quit" | "exit" => break,
            "fen" => {
                println!("{}", game.to_fen());
                continue;
            }
            _ => {}
        }

        // A lone square asks for the destinations of its piece
        if line.len() == 2 {
            match game.possible_moves(line) {
                Ok(destinations) => render(&game, destinations),
                Err(e) => println!("{}", e.to_string().yellow()),
            }
            continue;
        }

        let input = match MoveInput::from_uci(line) {
            Ok(input) => input,
            Err(e) => {
                println!("{}", e.to_string().yellow());
                continue;
            }
        };

        if let Err(e) = apply(&mut game, &input) {
            println!("{}", e.to_string().yellow());
            continue;
        }

        let highlights = if args.hints && !game.checkmate() {
            game.legal_moves()?
                .iter()
                .map(|mv| mv.to())
                .collect()
        } else {
            Bitboard::default()
        };
        println!();
        render(&game, highlights);
    }

    Ok(())
}
