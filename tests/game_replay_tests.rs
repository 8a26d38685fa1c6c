use colored::*;
use pgnboard::{
    board::Board,
    movetext::{Movetext, MovetextError},
};
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::PathBuf, time::Instant};
use thiserror::Error;

const EXIT_FAILURE: i32 = 1;

//======================================================================================================================
// Error handling
//======================================================================================================================

/// Errors that are related to the test harness.
#[derive(Error, Debug)]
enum TestHarnessError {
    #[error("The current directory cannot be read")]
    CurrentDirNotFound,

    #[error("Resource path not found: {0:?}")]
    ResourcePathNotFound(PathBuf),

    #[error("Cannot read the test data file ({0:?})")]
    CannotReadTestDataFile(PathBuf),

    #[error("Cannot parse the test data file: {0}")]
    CannotParseTestDataFile(#[from] serde_json::Error),
}

/// Errors used when tests fail.
#[derive(Error, Debug)]
enum TestFailureError {
    #[error("Unable to load the starting position \"{0}\"")]
    UnableToLoadStart(String),

    #[error("Unexpected replay error: {0}")]
    UnexpectedReplayError(MovetextError),

    #[error("Expected the replay to stop at ply {expected:?}, it stopped at {actual:?}")]
    UnexpectedStop { expected: Option<usize>, actual: Option<usize> },

    #[error("Unexpected position after the replay\n\nExpected: {expected}\nActual:   {actual}\n\n{board}")]
    UnexpectedPosition { expected: String, actual: String, board: String },

    #[error("Unexpected game state: check {check}, mate {mate}, stalemate {stalemate}")]
    UnexpectedState { check: bool, mate: bool, stalemate: bool },

    #[error("Undoing every move did not restore the starting position")]
    UndoMismatch,
}

/// Global errors for this module.
#[derive(Error, Debug)]
enum GameReplayTestError {
    #[error("Test harness error: {}", .0)]
    TestHarnessError(#[from] TestHarnessError),

    #[error("---- {} ----\n{}", .test_name, .test_failure_error)]
    TestFailed { test_name: String, test_failure_error: TestFailureError },
}

//======================================================================================================================
// Test data structures
//======================================================================================================================

/// A game to replay and the state expected at its end.
#[derive(Debug, Deserialize)]
struct Test {
    description: String,
    start: Option<String>,
    movetext: String,
    fen: String,
    illegal_ply: Option<usize>,
    check: bool,
    mate: bool,
    stalemate: bool,
}

/// Read the tests data from the file.
fn read_tests_data() -> Result<Vec<Test>, GameReplayTestError> {
    let tests_file_path = get_resource_path("assets/tests/game_replay_tests.json")?;
    let file = File::open(&tests_file_path).map_err(|_| TestHarnessError::CannotReadTestDataFile(tests_file_path))?;
    let reader = BufReader::new(file);
    let tests: Vec<Test> = serde_json::from_reader(reader).map_err(TestHarnessError::CannotParseTestDataFile)?;
    Ok(tests)
}

//======================================================================================================================
// Test harness
//======================================================================================================================

fn check_replay(test: &Test) -> Result<(), TestFailureError> {
    let start = match &test.start {
        Some(fen) => Board::from_fen(fen).map_err(|_| TestFailureError::UnableToLoadStart(fen.clone()))?,
        None => Board::new(),
    };
    let mut board = start.clone();

    let stopped_at = match Movetext::new(&test.movetext).replay(&mut board) {
        Ok(()) => None,
        Err(MovetextError::Illegal { ply, .. }) => Some(ply),
        Err(error) => return Err(TestFailureError::UnexpectedReplayError(error)),
    };
    if stopped_at != test.illegal_ply {
        return Err(TestFailureError::UnexpectedStop { expected: test.illegal_ply, actual: stopped_at });
    }

    let actual = board.to_fen();
    if actual != test.fen {
        return Err(TestFailureError::UnexpectedPosition {
            expected: test.fen.clone(),
            actual,
            board: board.to_ascii_string(false),
        });
    }

    let (check, mate, stalemate) = (board.is_check(), board.is_mate(), board.is_stalemate());
    if (check, mate, stalemate) != (test.check, test.mate, test.stalemate) {
        return Err(TestFailureError::UnexpectedState { check, mate, stalemate });
    }

    while !board.history().is_empty() {
        board.undo();
    }
    if board != start {
        return Err(TestFailureError::UndoMismatch);
    }

    Ok(())
}

/// Run a single test case.
fn run_test(test: Test) -> Result<(), GameReplayTestError> {
    check_replay(&test).map_err(|test_failure_error| GameReplayTestError::TestFailed {
        test_name: test.description,
        test_failure_error,
    })
}

/// Run all the tests. Returns the number of failed tests.
fn run_tests() -> Result<usize, GameReplayTestError> {
    let tests = read_tests_data()?;

    println!("\nrunning {} tests", tests.len());

    let start = Instant::now();
    let mut passed = 0;
    let mut failures: Vec<GameReplayTestError> = Vec::new();
    for test in tests {
        print!("test {} ...", test.description);
        let result_string = match run_test(test) {
            Ok(_) => {
                passed += 1;
                "ok".green()
            }
            Err(error) => {
                failures.push(error);
                "FAILED".red()
            }
        };
        println!(" {}", result_string);
    }
    let seconds = start.elapsed().as_secs_f32();

    for failure in &failures {
        println!("\n{}", failure)
    }

    println!(
        "\ntest result: {}. {} passed; {} failed; finished in {:.2}s\n",
        if failures.is_empty() { "ok".green() } else { "FAILED".red() },
        passed,
        failures.len(),
        seconds
    );

    Ok(failures.len())
}

//======================================================================================================================
// Main function and helpers
//======================================================================================================================

/// Get the path to a resource file.
fn get_resource_path(relative_path: &str) -> Result<PathBuf, TestHarnessError> {
    let mut path = std::env::current_dir().map_err(|_| TestHarnessError::CurrentDirNotFound)?;
    path.push(relative_path);

    if !path.exists() {
        return Err(TestHarnessError::ResourcePathNotFound(path));
    }

    Ok(path)
}

/// The main function for the test harness. It runs the tests and exits with a failure code if any
/// of them failed.
fn main() {
    match run_tests() {
        Ok(0) => {}
        Ok(_) => std::process::exit(EXIT_FAILURE),
        Err(error) => {
            eprintln!("{}", error);
            std::process::exit(EXIT_FAILURE)
        }
    }
}
