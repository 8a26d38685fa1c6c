use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};

use clap::Parser;
use pgnboard::{
    board::{Board, BoardError},
    config::{self, get_config},
    coordinates::{CoordinatesError, Square},
    movetext::Movetext,
    pgn::{PgnError, PgnReader},
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum PgnboardError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Board error: {0}")]
    BoardError(#[from] BoardError),

    #[error("PGN error: {0}")]
    PgnError(#[from] PgnError),

    #[error("Invalid square: {0}")]
    SquareError(#[from] CoordinatesError),
}

mod arguments {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};
    use pgnboard::fen::START_FEN;

    /// A chess rules engine driven by SAN and PGN
    #[derive(Parser)]
    #[command(name = "pgnboard", version = "0.1.0", about = "A chess rules engine driven by SAN and PGN")]
    pub struct PgnboardArgs {
        /// Path to a TOML configuration file
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        #[command(subcommand)]
        pub command: Option<Commands>,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Commands {
        /// Play a game by typing moves in SAN (default command)
        Play {
            /// FEN string of the starting position
            #[arg(short, long, default_value = START_FEN)]
            fen: String,
        },

        /// Replay every game of a PGN file
        Replay {
            /// The PGN file to read
            pgn: PathBuf,
        },

        /// List the legal destinations of a piece
        Legal {
            /// FEN string representing the position
            #[arg(short, long, default_value = START_FEN)]
            fen: String,

            /// The square of the piece, such as "e2"
            square: String,
        },
    }
}

//======================================================================================================================
// Commands
//======================================================================================================================

fn print_board(board: &Board) {
    let config = get_config();
    print!("{}", board.to_ascii_string(config.flip_board));
    if config.show_fen {
        println!("{}", board.to_fen());
    }
}

fn print_status(board: &Board) {
    if board.is_mate() {
        println!("Checkmate, {} wins", board.turn().opposite());
    } else if board.is_stalemate() {
        println!("Stalemate");
    } else if board.is_check() {
        println!("{} is in check", board.turn());
    }
}

fn print_legal(board: &Board, square: Square) {
    match board.legal_sqs(square) {
        Some(legal) => {
            let squares: Vec<String> = legal.squares.iter().map(|square| square.to_string()).collect();
            println!("{} {} on {square}: {}", legal.color, legal.piece_type, squares.join(" "));
        }
        None => println!("No piece on {square}"),
    }
}

/// Reads moves from the standard input until it is closed or `quit` is typed.
fn play(fen: &str) -> Result<(), PgnboardError> {
    let mut board = Board::from_fen(fen)?;
    print_board(&board);

    let stdin = io::stdin();
    loop {
        print!("{}> ", board.turn());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (None, _) => continue,
            (Some("quit"), _) => break,
            (Some("undo"), _) => {
                board.undo();
                print_board(&board);
            }
            (Some("board"), _) => print_board(&board),
            (Some("fen"), _) => println!("{}", board.to_fen()),
            (Some("moves"), _) => println!("{}", board.movetext()),
            (Some("legal"), Some(square)) => match Square::try_from(square) {
                Ok(square) => print_legal(&board, square),
                Err(error) => println!("{error}"),
            },
            (Some(san), _) => match board.play(board.turn(), san) {
                Ok(true) => {
                    print_board(&board);
                    print_status(&board);
                }
                Ok(false) => println!("Illegal move: {san}"),
                Err(error) => println!("{error}"),
            },
        }
    }

    Ok(())
}

/// Replays the games of a PGN file and prints the outcome of each one.
fn replay(path: PathBuf) -> Result<(), PgnboardError> {
    let reader = PgnReader::new(BufReader::new(File::open(path)?));

    for (index, game) in reader.enumerate() {
        let game = game?;
        let mut board = Board::new();
        let white = game.tag("White").unwrap_or("?");
        let black = game.tag("Black").unwrap_or("?");

        match Movetext::new(&game.movetext).replay(&mut board) {
            Ok(()) => println!("Game {} ({white} - {black}): {}", index + 1, board.to_fen()),
            Err(error) => println!("Game {} ({white} - {black}): {error}", index + 1),
        }
        print_status(&board);
    }

    Ok(())
}

fn legal(fen: &str, square: &str) -> Result<(), PgnboardError> {
    let board = Board::from_fen(fen)?;
    print_legal(&board, Square::try_from(square)?);
    Ok(())
}

//======================================================================================================================
// Main function and helpers
//======================================================================================================================

fn initialize_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&get_config().log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run() -> Result<(), PgnboardError> {
    // Parse command line arguments
    let args = arguments::PgnboardArgs::parse();

    config::initialize(args.config)?;
    initialize_logging();

    // Run the command
    let command = args.command.unwrap_or(arguments::Commands::Play { fen: pgnboard::fen::START_FEN.to_string() });
    match command {
        arguments::Commands::Play { fen } => play(&fen),
        arguments::Commands::Replay { pgn } => replay(pgn),
        arguments::Commands::Legal { fen, square } => legal(&fen, &square),
    }
}

/// Main entry point for pgnboard.
fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
