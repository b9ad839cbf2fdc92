//! Crossword filling library.
//!
//! This crate models a crossword grid and word list as a constraint
//! satisfaction problem and solves it: node consistency and AC-3 prune the
//! candidate domains, then backtracking search with MRV / degree /
//! least-constraining-value heuristics assigns one word per slot.

pub mod consistency;
pub mod crossword;
pub mod domains;
pub mod errors;
pub mod render;
pub mod solver;

// Re-export main types
pub use consistency::{ac3, enforce_node_consistency, revise};
pub use crossword::{Crossword, Direction, VarId, Variable, Word, WordId};
pub use domains::DomainStore;
pub use errors::ModelError;
pub use render::{format_grid, letter_grid};
pub use solver::{Assignment, Filler, SolveStatus, SolverConfig, SolverResult};
