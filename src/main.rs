//! CLI entry point for the crossword filler.
//!
//! Usage:
//!   crossword-filler solve <structure> <words> [options]
//!
//! Options:
//!   --timeout <seconds>   Maximum search time (unbounded by default)
//!   --max-nodes <n>       Maximum backtrack nodes (unbounded by default)
//!   --json                Emit a machine-readable JSON result
//!   --debug               Enable debug logging

mod consistency;
mod crossword;
mod domains;
mod errors;
mod render;
mod solver;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use serde::Serialize;

use crossword::{Crossword, Direction};
use render::format_grid;
use solver::{Filler, SolveStatus, SolverConfig, SolverResult};

#[derive(Parser)]
#[command(name = "crossword-filler")]
#[command(about = "CSP solver for filling crossword grids from a word list")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a grid structure using a word list
    Solve {
        /// Path to the structure file (`_` = open cell, anything else blocked)
        #[arg(value_name = "STRUCTURE")]
        structure: PathBuf,

        /// Path to the word list (one word per line)
        #[arg(value_name = "WORDS")]
        words: PathBuf,

        /// Maximum search time in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum number of backtrack nodes
        #[arg(long)]
        max_nodes: Option<usize>,

        /// Emit the result as JSON instead of a rendered grid
        #[arg(long)]
        json: bool,
    },
}

/// Output format for a solve result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveOutput {
    status: SolveStatus,
    nodes_explored: usize,
    time_elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    grid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<Vec<EntryOutput>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryOutput {
    row: usize,
    col: usize,
    direction: Direction,
    length: usize,
    word: String,
}

fn init_logger(debug_enabled: bool) {
    let level = if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    // Let RUST_LOG override our defaults if explicitly set
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    builder.init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.debug);

    match cli.command {
        Commands::Solve {
            structure,
            words,
            timeout,
            max_nodes,
            json,
        } => {
            let structure_text = match fs::read_to_string(&structure) {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("Failed to read structure file {:?}: {}", structure, e);
                    return ExitCode::FAILURE;
                }
            };
            let word_list = match fs::read_to_string(&words) {
                Ok(text) => load_word_list(&text),
                Err(e) => {
                    eprintln!("Failed to read word list {:?}: {}", words, e);
                    return ExitCode::FAILURE;
                }
            };

            let model = match Crossword::parse(&structure_text, &word_list) {
                Ok(model) => model,
                Err(e) => {
                    eprintln!("Error building crossword model: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            let config = SolverConfig {
                timeout: timeout.map(Duration::from_secs),
                max_nodes,
            };

            let result = match Filler::new(&model).solve(&config) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Solver fault: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            if json {
                let output = format_result(&model, &result);
                match serde_json::to_string_pretty(&output) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Failed to serialize result: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                match &result.assignment {
                    Some(assignment) => print!("{}", format_grid(&model, assignment)),
                    None => println!("No solution."),
                }
            }

            if result.status == SolveStatus::Solved {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// One word per line, uppercased, blanks skipped, as the classic word-list
/// format expects.
fn load_word_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn format_result(model: &Crossword, result: &SolverResult) -> SolveOutput {
    let entries = result.assignment.as_ref().map(|assignment| {
        let mut entries: Vec<EntryOutput> = assignment
            .iter()
            .map(|(&var, &word)| {
                let variable = model.variable(var);
                EntryOutput {
                    row: variable.row,
                    col: variable.col,
                    direction: variable.direction,
                    length: variable.length,
                    word: model.word(word).text().to_string(),
                }
            })
            .collect();
        entries.sort_by_key(|e| (e.row, e.col, e.direction == Direction::Down));
        entries
    });

    SolveOutput {
        status: result.status,
        nodes_explored: result.nodes_explored,
        time_elapsed_ms: result.time_elapsed_ms,
        grid: result
            .assignment
            .as_ref()
            .map(|assignment| format_grid(model, assignment)),
        entries,
    }
}
