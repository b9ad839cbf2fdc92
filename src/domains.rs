//! Per-variable candidate domains.
//!
//! One `DomainStore` is owned by each solve invocation. Domains are seeded
//! with an independent copy of the full word list per variable and only ever
//! shrink; the consistency engine is the sole mutator, the search reads.

use crate::crossword::{Crossword, VarId, WordId};

/// Candidate word ids per variable, each kept sorted ascending (seeded in
/// word-list order; pruning preserves order), so membership is a binary
/// search.
#[derive(Debug, Clone)]
pub struct DomainStore {
    domains: Vec<Vec<WordId>>,
}

impl DomainStore {
    /// Seed every variable's domain with the full word list.
    pub fn seed(model: &Crossword) -> Self {
        let all: Vec<WordId> = (0..model.words().len()).collect();
        Self {
            domains: vec![all; model.variables().len()],
        }
    }

    pub fn candidates(&self, var: VarId) -> &[WordId] {
        &self.domains[var]
    }

    pub fn size(&self, var: VarId) -> usize {
        self.domains[var].len()
    }

    pub fn is_empty(&self, var: VarId) -> bool {
        self.domains[var].is_empty()
    }

    pub fn contains(&self, var: VarId, word: WordId) -> bool {
        self.domains[var].binary_search(&word).is_ok()
    }

    /// Keep only candidates satisfying `keep`; returns how many were removed.
    pub fn retain<F>(&mut self, var: VarId, mut keep: F) -> usize
    where
        F: FnMut(WordId) -> bool,
    {
        let before = self.domains[var].len();
        self.domains[var].retain(|&word| keep(word));
        before - self.domains[var].len()
    }

    /// The id of some variable whose domain is empty, if any (lowest id).
    pub fn first_empty(&self) -> Option<VarId> {
        self.domains.iter().position(Vec::is_empty)
    }
}
