//! Crossword puzzle model: grid structure, slot variables, overlaps.
//!
//! The structure text format uses `_` for an open cell; any other character
//! (conventionally `#` or `█`) is blocked. A variable is a maximal horizontal
//! or vertical run of at least two open cells. The model is immutable once
//! built; the solver only reads it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::errors::ModelError;

/// An identifier for a variable, indexing into [`Crossword::variables`].
///
/// Variable ids follow grid-scan order (across slots row-major, then down
/// slots row-major); this is the deterministic enumeration order used for
/// heuristic tie-breaking.
pub type VarId = usize;

/// An identifier for a word, indexing into [`Crossword::words`].
pub type WordId = usize;

/// Expected upper bound on crossings per slot; longer slots spill to the heap.
pub const TYPICAL_NEIGHBOR_COUNT: usize = 8;

/// Orientation of a slot in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// Per-step (row, col) offset when walking a slot's cells.
    pub fn delta(self) -> (usize, usize) {
        match self {
            Direction::Across => (0, 1),
            Direction::Down => (1, 0),
        }
    }
}

/// A slot variable: a maximal straight run of open cells.
///
/// Two variables are equal iff all four fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    pub fn new(row: usize, col: usize, direction: Direction, length: usize) -> Self {
        Self {
            row,
            col,
            direction,
            length,
        }
    }

    /// The (row, col) of the k-th cell of this slot.
    pub fn cell(&self, k: usize) -> (usize, usize) {
        let (dr, dc) = self.direction.delta();
        (self.row + k * dr, self.col + k * dc)
    }

    /// All cells occupied by this slot, in order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.length).map(|k| self.cell(k))
    }
}

/// A candidate word, with its characters pre-split so overlap positions index
/// code points rather than bytes.
#[derive(Debug, Clone)]
pub struct Word {
    text: String,
    chars: Vec<char>,
}

impl Word {
    fn new(text: String) -> Self {
        let chars = text.chars().collect();
        Self { text, chars }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters (code points).
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }
}

/// The complete puzzle model: grid mask, variables, word list, overlaps and
/// neighbor lists. Built once, read-only afterwards.
#[derive(Debug)]
pub struct Crossword {
    height: usize,
    width: usize,
    open: Vec<Vec<bool>>,
    variables: Vec<Variable>,
    words: Vec<Word>,
    /// Sparse overlap relation: for an ordered pair (x, y) of crossing
    /// variables, the (index into x's word, index into y's word) that must
    /// hold the same character. Absent key = no shared cell.
    overlaps: HashMap<(VarId, VarId), (usize, usize)>,
    neighbors: Vec<SmallVec<[VarId; TYPICAL_NEIGHBOR_COUNT]>>,
}

impl Crossword {
    /// Build a model from structure text and a word list.
    ///
    /// Duplicate words are dropped (first occurrence wins). Words are taken
    /// as-is; comparison throughout the solver is case-sensitive.
    pub fn parse(structure: &str, words: &[String]) -> Result<Self, ModelError> {
        let open = parse_structure(structure)?;
        let height = open.len();
        let width = open[0].len();

        let variables = find_variables(&open);

        let mut seen = HashSet::new();
        let mut word_list = Vec::new();
        for text in words {
            if seen.insert(text.clone()) {
                word_list.push(Word::new(text.clone()));
            }
        }

        let (overlaps, neighbors) = compute_overlaps(&variables);

        let model = Self {
            height,
            width,
            open,
            variables,
            words: word_list,
            overlaps,
            neighbors,
        };
        model.validate()?;
        Ok(model)
    }

    /// Build a model directly from variables, for callers that construct the
    /// grid geometry themselves. Bounds are not checked against a mask, but
    /// variable lengths and overlap indices are validated.
    pub fn from_variables(
        height: usize,
        width: usize,
        variables: Vec<Variable>,
        words: &[String],
    ) -> Result<Self, ModelError> {
        let open = vec![vec![true; width]; height];
        let (overlaps, neighbors) = compute_overlaps(&variables);
        let model = Self {
            height,
            width,
            open,
            variables,
            words: words.iter().cloned().map(Word::new).collect(),
            overlaps,
            neighbors,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        for (id, var) in self.variables.iter().enumerate() {
            if var.length == 0 {
                return Err(ModelError::invalid(format!(
                    "variable {} at ({}, {}) has zero length",
                    id, var.row, var.col
                )));
            }
        }
        for (&(x, y), &(ix, iy)) in &self.overlaps {
            let (vx, vy) = (&self.variables[x], &self.variables[y]);
            if ix >= vx.length || iy >= vy.length {
                return Err(ModelError::invalid(format!(
                    "overlap ({}, {}) out of bounds for variables {} (len {}) and {} (len {})",
                    ix, iy, x, vx.length, y, vy.length
                )));
            }
        }
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the cell at (row, col) is open (fillable).
    pub fn is_open(&self, row: usize, col: usize) -> bool {
        self.open[row][col]
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id]
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word(&self, id: WordId) -> &Word {
        &self.words[id]
    }

    /// Variables sharing at least one cell with `id`.
    pub fn neighbors(&self, id: VarId) -> &[VarId] {
        &self.neighbors[id]
    }

    /// The overlap offsets for the ordered pair (x, y), or `None` if the two
    /// variables do not cross.
    pub fn overlap(&self, x: VarId, y: VarId) -> Option<(usize, usize)> {
        self.overlaps.get(&(x, y)).copied()
    }
}

fn parse_structure(structure: &str) -> Result<Vec<Vec<bool>>, ModelError> {
    let lines: Vec<&str> = structure.lines().collect();
    if lines.is_empty() {
        return Err(ModelError::structure("structure text is empty"));
    }
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    if width == 0 {
        return Err(ModelError::structure("structure has no columns"));
    }

    // Short lines are padded with blocked cells.
    let open = lines
        .iter()
        .map(|line| {
            let mut row: Vec<bool> = line.chars().map(|c| c == '_').collect();
            row.resize(width, false);
            row
        })
        .collect();
    Ok(open)
}

/// Scan the mask for maximal runs of >= 2 open cells, across then down, each
/// in row-major order of starting cell.
fn find_variables(open: &[Vec<bool>]) -> Vec<Variable> {
    let height = open.len();
    let width = open[0].len();
    let mut variables = Vec::new();

    for row in 0..height {
        for col in 0..width {
            let starts_across = open[row][col] && (col == 0 || !open[row][col - 1]);
            if starts_across {
                let length = (col..width).take_while(|&c| open[row][c]).count();
                if length >= 2 {
                    variables.push(Variable::new(row, col, Direction::Across, length));
                }
            }
        }
    }
    for row in 0..height {
        for col in 0..width {
            let starts_down = open[row][col] && (row == 0 || !open[row - 1][col]);
            if starts_down {
                let length = (row..height).take_while(|&r| open[r][col]).count();
                if length >= 2 {
                    variables.push(Variable::new(row, col, Direction::Down, length));
                }
            }
        }
    }

    variables
}

type OverlapMap = HashMap<(VarId, VarId), (usize, usize)>;
type NeighborLists = Vec<SmallVec<[VarId; TYPICAL_NEIGHBOR_COUNT]>>;

/// Intersect every pair of variables cell-wise and record both orderings of
/// each crossing.
fn compute_overlaps(variables: &[Variable]) -> (OverlapMap, NeighborLists) {
    let mut cell_index: Vec<HashMap<(usize, usize), usize>> = Vec::with_capacity(variables.len());
    for var in variables {
        cell_index.push(var.cells().enumerate().map(|(k, cell)| (cell, k)).collect());
    }

    let mut overlaps = HashMap::new();
    let mut neighbors: NeighborLists = vec![SmallVec::new(); variables.len()];

    for x in 0..variables.len() {
        for y in (x + 1)..variables.len() {
            let shared = cell_index[x]
                .iter()
                .find_map(|(cell, &ix)| cell_index[y].get(cell).map(|&iy| (ix, iy)));
            if let Some((ix, iy)) = shared {
                overlaps.insert((x, y), (ix, iy));
                overlaps.insert((y, x), (iy, ix));
                neighbors[x].push(y);
                neighbors[y].push(x);
            }
        }
    }

    // Neighbor lists in enumeration order for deterministic arc queues.
    for list in &mut neighbors {
        list.sort_unstable();
    }

    (overlaps, neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // 3x3 grid, open top row and open left column:
    //   ___
    //   _##
    //   _##
    fn create_corner_model() -> Crossword {
        Crossword::parse("___\n_##\n_##", &words(&["AAA", "ABC", "XYZ"])).unwrap()
    }

    #[test]
    fn test_parse_finds_variables_in_scan_order() {
        let model = create_corner_model();
        assert_eq!(
            model.variables(),
            &[
                Variable::new(0, 0, Direction::Across, 3),
                Variable::new(0, 0, Direction::Down, 3),
            ]
        );
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let model = create_corner_model();
        assert_eq!(model.overlap(0, 1), Some((0, 0)));
        assert_eq!(model.overlap(1, 0), Some((0, 0)));
    }

    #[test]
    fn test_no_overlap_for_disjoint_slots() {
        // Two separate across slots with no column shared between open rows.
        let model = Crossword::parse("__#\n###\n#__", &words(&["AB"])).unwrap();
        assert_eq!(model.variables().len(), 2);
        assert_eq!(model.overlap(0, 1), None);
        assert!(model.neighbors(0).is_empty());
    }

    #[test]
    fn test_neighbors_listed_in_order() {
        // A 3x3 fully open grid: 3 across + 3 down variables.
        let model = Crossword::parse("___\n___\n___", &words(&["AAA"])).unwrap();
        assert_eq!(model.variables().len(), 6);
        // First across slot (row 0) crosses all three down slots.
        assert_eq!(model.neighbors(0), &[3, 4, 5]);
    }

    #[test]
    fn test_single_cell_runs_are_not_variables() {
        let model = Crossword::parse("_#_\n###", &words(&[])).unwrap();
        assert!(model.variables().is_empty());
    }

    #[test]
    fn test_short_lines_padded_as_blocked() {
        let model = Crossword::parse("___\n_", &words(&["AAA"])).unwrap();
        assert!(model.is_open(0, 2));
        assert!(!model.is_open(1, 1));
    }

    #[test]
    fn test_duplicate_words_dropped() {
        let model = Crossword::parse("__", &words(&["AB", "AB", "CD"])).unwrap();
        assert_eq!(model.words().len(), 2);
    }

    #[test]
    fn test_zero_length_variable_rejected() {
        let vars = vec![Variable::new(0, 0, Direction::Across, 0)];
        let err = Crossword::from_variables(1, 1, vars, &words(&["A"]));
        assert!(matches!(err, Err(ModelError::InvalidModel { .. })));
    }

    #[test]
    fn test_empty_structure_rejected() {
        assert!(matches!(
            Crossword::parse("", &words(&[])),
            Err(ModelError::Structure { .. })
        ));
    }

    #[test]
    fn test_word_length_in_code_points() {
        let model = Crossword::parse("__", &words(&["ÆØ"])).unwrap();
        assert_eq!(model.word(0).len(), 2);
        assert_eq!(model.word(0).char_at(1), Some('Ø'));
    }
}
