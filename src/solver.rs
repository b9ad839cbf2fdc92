//! Backtracking search over the pruned domains.
//!
//! The search assigns one variable per recursive step, choosing variables by
//! minimum remaining values (ties: larger degree, then lower variable id) and
//! values by the least-constraining-value count. Domains are pruned once by
//! the consistency pass before the search starts; during the search only the
//! assignment map mutates, with an unconditional undo on every failing path.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::Serialize;

use crate::consistency::{ac3, enforce_node_consistency};
use crate::crossword::{Crossword, VarId, WordId};
use crate::domains::DomainStore;
use crate::errors::ModelError;

/// Configuration for a solve. Both budgets are optional; the core search is
/// unbounded and exact.
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    /// Maximum wall-clock time before the search gives up.
    pub timeout: Option<Duration>,
    /// Maximum number of backtrack nodes before the search gives up.
    pub max_nodes: Option<usize>,
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// A complete, consistent assignment was found.
    Solved,
    /// The puzzle is proven unsolvable (propagation wipeout or exhausted
    /// search space).
    NoSolution,
    /// A timeout or node budget stopped the search before an answer was
    /// proven either way.
    BudgetExhausted,
}

/// A (possibly partial) mapping from variables to chosen words.
pub type Assignment = HashMap<VarId, WordId>;

/// Result of a solve.
#[derive(Debug, Clone)]
pub struct SolverResult {
    pub status: SolveStatus,
    /// The complete assignment, present iff `status` is `Solved`.
    pub assignment: Option<Assignment>,
    /// Number of backtrack calls made.
    pub nodes_explored: usize,
    pub time_elapsed_ms: u64,
}

/// Outcome of one recursive backtrack call.
enum SearchOutcome {
    /// The assignment is complete; unwind without exploring further.
    Complete,
    /// All candidates for the chosen variable failed.
    Exhausted,
    /// A budget ran out mid-search.
    Aborted,
}

struct SearchState {
    deadline: Option<Instant>,
    max_nodes: Option<usize>,
    nodes: usize,
}

impl SearchState {
    fn new(config: &SolverConfig, start: Instant) -> Self {
        Self {
            deadline: config.timeout.map(|t| start + t),
            max_nodes: config.max_nodes,
            nodes: 0,
        }
    }

    fn out_of_budget(&self) -> bool {
        if let Some(max) = self.max_nodes {
            if self.nodes >= max {
                return true;
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() > deadline {
                return true;
            }
        }
        false
    }
}

/// One solve invocation: owns the domain store; borrows the model.
pub struct Filler<'a> {
    model: &'a Crossword,
    domains: DomainStore,
}

impl<'a> Filler<'a> {
    pub fn new(model: &'a Crossword) -> Self {
        Self {
            model,
            domains: DomainStore::seed(model),
        }
    }

    /// Enforce node and arc consistency, then search.
    ///
    /// Propagation failure (an emptied domain) returns `NoSolution` without
    /// invoking the search at all. No further inference happens during the
    /// search; candidates come from the pruned domains and each tentative
    /// binding is checked with [`Filler::consistent`].
    pub fn solve(&mut self, config: &SolverConfig) -> Result<SolverResult, ModelError> {
        let start = Instant::now();

        enforce_node_consistency(self.model, &mut self.domains);
        // An isolated variable has no arcs, so its emptied domain would never
        // be seen by AC-3.
        if let Some(var) = self.domains.first_empty() {
            debug!("domain of variable {} empty after node consistency", var);
            return Ok(Self::finished(SolveStatus::NoSolution, None, 0, start));
        }
        if !ac3(self.model, &mut self.domains, None)? {
            return Ok(Self::finished(SolveStatus::NoSolution, None, 0, start));
        }

        let mut assignment = Assignment::new();
        let mut search = SearchState::new(config, start);
        let outcome = self.backtrack(&mut assignment, &mut search);

        let result = match outcome {
            SearchOutcome::Complete => {
                Self::finished(SolveStatus::Solved, Some(assignment), search.nodes, start)
            }
            SearchOutcome::Exhausted => {
                Self::finished(SolveStatus::NoSolution, None, search.nodes, start)
            }
            SearchOutcome::Aborted => {
                Self::finished(SolveStatus::BudgetExhausted, None, search.nodes, start)
            }
        };
        info!(
            "solve finished: {:?} after {} node(s) in {} ms",
            result.status, result.nodes_explored, result.time_elapsed_ms
        );
        Ok(result)
    }

    fn finished(
        status: SolveStatus,
        assignment: Option<Assignment>,
        nodes: usize,
        start: Instant,
    ) -> SolverResult {
        SolverResult {
            status,
            assignment,
            nodes_explored: nodes,
            time_elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Recursive depth-first search. The tentative binding is removed on
    /// every path that does not propagate success upward.
    fn backtrack(&self, assignment: &mut Assignment, search: &mut SearchState) -> SearchOutcome {
        if search.out_of_budget() {
            return SearchOutcome::Aborted;
        }
        search.nodes += 1;

        if self.assignment_complete(assignment) {
            return SearchOutcome::Complete;
        }

        let var = self.select_unassigned_variable(assignment);
        for word in self.order_domain_values(var, assignment) {
            assignment.insert(var, word);
            if self.consistent(assignment) {
                match self.backtrack(assignment, search) {
                    SearchOutcome::Complete => return SearchOutcome::Complete,
                    SearchOutcome::Aborted => {
                        assignment.remove(&var);
                        return SearchOutcome::Aborted;
                    }
                    SearchOutcome::Exhausted => {}
                }
            }
            assignment.remove(&var);
        }
        SearchOutcome::Exhausted
    }

    /// Minimum-remaining-values choice among unassigned variables. Ties break
    /// by larger neighbor count, then by lower variable id (enumeration
    /// order), so the choice is deterministic.
    pub fn select_unassigned_variable(&self, assignment: &Assignment) -> VarId {
        let mut best: Option<VarId> = None;
        for var in 0..self.model.variables().len() {
            if assignment.contains_key(&var) {
                continue;
            }
            best = Some(match best {
                None => var,
                Some(b) => {
                    let (size, degree) = (self.domains.size(var), self.model.neighbors(var).len());
                    let (best_size, best_degree) =
                        (self.domains.size(b), self.model.neighbors(b).len());
                    if size < best_size || (size == best_size && degree > best_degree) {
                        var
                    } else {
                        b
                    }
                }
            });
        }
        // solve() only searches while some variable is unassigned.
        best.unwrap_or(0)
    }

    /// Candidates for `var`, least-constraining first: ascending by how many
    /// unassigned neighbors still have the identical word in their domain.
    /// The sort is stable, so ties keep word-list order.
    pub fn order_domain_values(&self, var: VarId, assignment: &Assignment) -> Vec<WordId> {
        let mut scored: Vec<(WordId, usize)> = self
            .domains
            .candidates(var)
            .iter()
            .map(|&word| {
                let ruled_out = self
                    .model
                    .neighbors(var)
                    .iter()
                    .filter(|&&n| !assignment.contains_key(&n) && self.domains.contains(n, word))
                    .count();
                (word, ruled_out)
            })
            .collect();
        scored.sort_by_key(|&(_, ruled_out)| ruled_out);
        scored.into_iter().map(|(word, _)| word).collect()
    }

    /// Whether the partial assignment violates no constraint: words pairwise
    /// distinct, lengths exact, crossing characters equal.
    pub fn consistent(&self, assignment: &Assignment) -> bool {
        let vars: Vec<VarId> = assignment.keys().copied().collect();

        for (i, &x) in vars.iter().enumerate() {
            let wx = self.model.word(assignment[&x]);
            if wx.len() != self.model.variable(x).length {
                return false;
            }
            for &y in &vars[i + 1..] {
                let wy = self.model.word(assignment[&y]);
                // Words are interned uniquely, so id equality is text
                // equality.
                if assignment[&x] == assignment[&y] {
                    return false;
                }
                if let Some((ix, iy)) = self.model.overlap(x, y) {
                    match (wx.char_at(ix), wy.char_at(iy)) {
                        (Some(a), Some(b)) if a == b => {}
                        _ => return false,
                    }
                }
            }
        }
        true
    }

    /// Whether every variable in the model is assigned.
    pub fn assignment_complete(&self, assignment: &Assignment) -> bool {
        assignment.len() == self.model.variables().len()
    }

    pub fn domains(&self) -> &DomainStore {
        &self.domains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossword::{Crossword, Direction, Variable};

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn solve(model: &Crossword) -> SolverResult {
        Filler::new(model).solve(&SolverConfig::default()).unwrap()
    }

    fn assert_valid_solution(model: &Crossword, result: &SolverResult) {
        assert_eq!(result.status, SolveStatus::Solved);
        let assignment = result.assignment.as_ref().unwrap();
        assert_eq!(assignment.len(), model.variables().len());
        for (&var, &word) in assignment {
            assert_eq!(model.word(word).len(), model.variable(var).length);
        }
        for (&x, &wx) in assignment {
            for (&y, &wy) in assignment {
                if x == y {
                    continue;
                }
                assert_ne!(wx, wy, "duplicate word across slots");
                if let Some((ix, iy)) = model.overlap(x, y) {
                    assert_eq!(model.word(wx).char_at(ix), model.word(wy).char_at(iy));
                }
            }
        }
    }

    #[test]
    fn test_two_crossing_slots_share_first_letter() {
        // Across (0,0,3) and down (0,0,3) cross at index 0 of both.
        let model = Crossword::parse("___\n_##\n_##", &words(&["AAA", "ABC", "XYZ"])).unwrap();
        let result = solve(&model);
        assert_valid_solution(&model, &result);

        let assignment = result.assignment.unwrap();
        let wx = model.word(assignment[&0]);
        let wy = model.word(assignment[&1]);
        assert_eq!(wx.char_at(0), wy.char_at(0));
    }

    #[test]
    fn test_isolated_variable_always_solved() {
        let model = Crossword::parse("____", &words(&["WORD", "GAME"])).unwrap();
        let result = solve(&model);
        assert_valid_solution(&model, &result);
        let word = model.word(result.assignment.unwrap()[&0]).text().to_string();
        assert!(word == "WORD" || word == "GAME");
    }

    #[test]
    fn test_all_words_too_short_skips_search() {
        let model = Crossword::parse("____", &words(&["AB", "CAT"])).unwrap();
        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::NoSolution);
        assert_eq!(result.nodes_explored, 0);
    }

    #[test]
    fn test_incompatible_crossing_terminates_with_no_solution() {
        // Crossing forces across[1] == down[0]; "CAT"/"DOG" offer 'A'/'O'
        // there but only 'C'/'D' as first letters.
        let model = Crossword::parse("___\n#_#\n#_#", &words(&["CAT", "DOG"])).unwrap();
        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::NoSolution);
        assert!(result.assignment.is_none());
    }

    #[test]
    fn test_unique_solution_found_exactly() {
        // across[1] must equal down[0]: only across="CAT", down="ATE" works
        // (the swap fails, 'T' != 'C').
        let model = Crossword::parse("___\n#_#\n#_#", &words(&["CAT", "ATE"])).unwrap();
        let result = solve(&model);
        assert_valid_solution(&model, &result);
        let assignment = result.assignment.unwrap();
        assert_eq!(model.word(assignment[&0]).text(), "CAT");
        assert_eq!(model.word(assignment[&1]).text(), "ATE");
    }

    #[test]
    fn test_distinct_words_required() {
        // Both slots are length 3 and cross; with only one word available,
        // the same word cannot be reused.
        let model = Crossword::parse("___\n_##\n_##", &words(&["AAA"])).unwrap();
        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::NoSolution);
    }

    #[test]
    fn test_full_grid_fill() {
        // 3x3 open grid: three across + three down slots, all crossing.
        // Rows ABC/DEF/GHI with columns ADG/BEH/CFI is one valid fill.
        let list = words(&[
            "ABC", "DEF", "GHI", "ADG", "BEH", "CFI", "AAA", "ZZZ", "QQQ",
        ]);
        let model = Crossword::parse("___\n___\n___", &list).unwrap();
        let result = solve(&model);
        assert_valid_solution(&model, &result);
    }

    #[test]
    fn test_node_budget_reports_budget_exhausted() {
        let model = Crossword::parse("___\n_##\n_##", &words(&["AAA", "ABC", "XYZ"])).unwrap();
        let config = SolverConfig {
            timeout: None,
            max_nodes: Some(0),
        };
        let result = Filler::new(&model).solve(&config).unwrap();
        assert_eq!(result.status, SolveStatus::BudgetExhausted);
        assert!(result.assignment.is_none());
    }

    #[test]
    fn test_select_unassigned_variable_prefers_smallest_domain() {
        // Across slot length 4, down slot length 2; one 4-letter word and two
        // 2-letter words survive node consistency, so MRV picks the across
        // slot.
        let model = Crossword::parse("____\n#__#", &words(&["WORD", "OR", "RD"])).unwrap();
        let mut filler = Filler::new(&model);
        enforce_node_consistency(&model, &mut filler.domains);
        assert_eq!(filler.select_unassigned_variable(&Assignment::new()), 0);
    }

    #[test]
    fn test_select_unassigned_variable_breaks_ties_by_lowest_id() {
        // All six slots of a 3x3 grid tie on domain size and degree, so the
        // first-enumerated variable wins.
        let model = Crossword::parse("___\n___\n___", &words(&["AAA", "BBB"])).unwrap();
        let filler = Filler::new(&model);
        assert_eq!(filler.select_unassigned_variable(&Assignment::new()), 0);
    }

    #[test]
    fn test_select_skips_assigned_variables() {
        let model = Crossword::parse("___\n_##\n_##", &words(&["AAA", "ABC"])).unwrap();
        let filler = Filler::new(&model);
        let mut assignment = Assignment::new();
        assignment.insert(0, 0);
        assert_eq!(filler.select_unassigned_variable(&assignment), 1);
    }

    #[test]
    fn test_order_domain_values_stable_on_ties() {
        // Across and down share their full candidate lists, so every word
        // rules out exactly one neighbor value; equal counts keep word-list
        // order.
        let model = Crossword::parse("___\n_##\n_##", &words(&["AAA", "ABC", "XYZ"])).unwrap();
        let filler = Filler::new(&model);
        let ordered = filler.order_domain_values(0, &Assignment::new());
        assert_eq!(ordered, vec![0, 1, 2]);
    }

    #[test]
    fn test_order_domain_values_ignores_assigned_neighbors() {
        let model = Crossword::parse("___\n_##\n_##", &words(&["AAA", "ABC"])).unwrap();
        let filler = Filler::new(&model);
        let mut assignment = Assignment::new();
        assignment.insert(1, 1);
        // The only neighbor is assigned, so every candidate rules out 0
        // values and word-list order is preserved.
        assert_eq!(filler.order_domain_values(0, &assignment), vec![0, 1]);
    }

    #[test]
    fn test_consistent_rejects_overlap_mismatch() {
        let model = Crossword::parse("___\n_##\n_##", &words(&["ABC", "XYZ"])).unwrap();
        let filler = Filler::new(&model);
        let mut assignment = Assignment::new();
        assignment.insert(0, 0);
        assignment.insert(1, 1);
        assert!(!filler.consistent(&assignment));
    }

    #[test]
    fn test_consistent_rejects_duplicate_word() {
        let model = Crossword::parse("__#\n#__", &words(&["AB", "CD"])).unwrap();
        let filler = Filler::new(&model);
        let mut assignment = Assignment::new();
        assignment.insert(0, 0);
        assignment.insert(1, 0);
        assert!(!filler.consistent(&assignment));
    }

    #[test]
    fn test_consistent_rejects_wrong_length() {
        let model = Crossword::parse("___\n_##\n_##", &words(&["AAA", "AB"])).unwrap();
        let filler = Filler::new(&model);
        let mut assignment = Assignment::new();
        // "AB" (id 1) cannot fill a length-3 slot.
        assignment.insert(0, 1);
        assert!(!filler.consistent(&assignment));
    }

    #[test]
    fn test_consistent_accepts_partial_valid_assignment() {
        let model = Crossword::parse("___\n_##\n_##", &words(&["AAA", "ABC"])).unwrap();
        let filler = Filler::new(&model);
        let mut assignment = Assignment::new();
        assignment.insert(0, 0);
        assert!(filler.consistent(&assignment));
    }

    #[test]
    fn test_assignment_complete() {
        let model = Crossword::parse("___\n_##\n_##", &words(&["AAA", "ABC"])).unwrap();
        let filler = Filler::new(&model);
        let mut assignment = Assignment::new();
        assert!(!filler.assignment_complete(&assignment));
        assignment.insert(0, 0);
        assignment.insert(1, 1);
        assert!(filler.assignment_complete(&assignment));
    }

    #[test]
    fn test_empty_grid_is_trivially_solved() {
        // No variables at all: backtrack returns immediately.
        let model = Crossword::parse("_#\n##", &words(&["AB"])).unwrap();
        assert!(model.variables().is_empty());
        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Solved);
        assert!(result.assignment.unwrap().is_empty());
    }

    #[test]
    fn test_variable_enumeration_matches_grid_scan() {
        let model = Crossword::parse("___\n#_#\n#_#", &words(&["CAT", "ATE"])).unwrap();
        assert_eq!(model.variable(1), &Variable::new(0, 1, Direction::Down, 3));
    }
}
