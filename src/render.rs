//! Rendering a (partial) assignment back onto the grid.
//!
//! Pure string formatting; the caller decides where the output goes.

use crate::crossword::Crossword;
use crate::solver::Assignment;

/// Lay the assigned words onto a height x width grid of letters.
pub fn letter_grid(model: &Crossword, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; model.width()]; model.height()];
    for (&var, &word) in assignment {
        let variable = model.variable(var);
        let word = model.word(word);
        for (k, (row, col)) in variable.cells().enumerate() {
            letters[row][col] = word.char_at(k);
        }
    }
    letters
}

/// Format the assignment as terminal text: blocked cells as `█`, unfilled
/// open cells as spaces.
pub fn format_grid(model: &Crossword, assignment: &Assignment) -> String {
    let letters = letter_grid(model, assignment);
    let mut out = String::with_capacity((model.width() + 1) * model.height());
    for row in 0..model.height() {
        for col in 0..model.width() {
            if model.is_open(row, col) {
                out.push(letters[row][col].unwrap_or(' '));
            } else {
                out.push('█');
            }
        }
        out.push('\n');
    }
    out
}
