//! Node and arc consistency over the domain store.
//!
//! Node consistency drops every candidate whose length differs from its
//! variable's length. Arc consistency (AC-3) then drops every candidate with
//! no compatible partner in a crossing variable's domain, re-examining arcs
//! whose target shrank until a fixpoint is reached. Propagation order does
//! not change the resulting domains (the fixpoint is unique), only the work
//! done; the worklist is FIFO.

use std::collections::VecDeque;

use log::debug;

use crate::crossword::{Crossword, VarId};
use crate::domains::DomainStore;
use crate::errors::ModelError;

/// Remove from every domain the words whose length differs from the
/// variable's length. Idempotent.
pub fn enforce_node_consistency(model: &Crossword, domains: &mut DomainStore) {
    let mut removed = 0;
    for (id, var) in model.variables().iter().enumerate() {
        removed += domains.retain(id, |word| model.word(word).len() == var.length);
    }
    debug!("node consistency removed {} candidate(s)", removed);
}

/// Make `x` arc-consistent with `y`: remove from x's domain every word with
/// no supporting word in y's *current* domain at the overlap positions.
///
/// Returns whether anything was removed. A pair without an overlap relation
/// is a no-op. A candidate shorter than its overlap index means the store is
/// not node-consistent with the model; that is reported as a fault rather
/// than read out of range.
pub fn revise(
    model: &Crossword,
    domains: &mut DomainStore,
    x: VarId,
    y: VarId,
) -> Result<bool, ModelError> {
    let Some((ix, iy)) = model.overlap(x, y) else {
        return Ok(false);
    };

    // Every character y can still place at the shared cell.
    let mut support = Vec::new();
    for &word in domains.candidates(y) {
        let c = model.word(word).char_at(iy).ok_or_else(|| {
            ModelError::invalid(format!(
                "candidate {:?} for variable {} is shorter than overlap index {}",
                model.word(word).text(),
                y,
                iy
            ))
        })?;
        if !support.contains(&c) {
            support.push(c);
        }
    }

    let mut fault = None;
    let removed = domains.retain(x, |word| match model.word(word).char_at(ix) {
        Some(c) => support.contains(&c),
        None => {
            fault = Some(word);
            true
        }
    });
    if let Some(word) = fault {
        return Err(ModelError::invalid(format!(
            "candidate {:?} for variable {} is shorter than overlap index {}",
            model.word(word).text(),
            x,
            ix
        )));
    }
    Ok(removed > 0)
}

/// Run AC-3 over `initial_arcs`, defaulting to all ordered neighbor pairs in
/// variable enumeration order.
///
/// Returns `Ok(true)` when every domain is arc-consistent and non-empty,
/// `Ok(false)` when propagation emptied some domain (the puzzle is
/// unsolvable).
pub fn ac3(
    model: &Crossword,
    domains: &mut DomainStore,
    initial_arcs: Option<Vec<(VarId, VarId)>>,
) -> Result<bool, ModelError> {
    let mut queue: VecDeque<(VarId, VarId)> = match initial_arcs {
        Some(arcs) => arcs.into(),
        None => (0..model.variables().len())
            .flat_map(|x| model.neighbors(x).iter().map(move |&y| (x, y)))
            .collect(),
    };

    while let Some((x, y)) = queue.pop_front() {
        if revise(model, domains, x, y)? {
            if domains.is_empty(x) {
                debug!("ac3: domain of variable {} wiped out against {}", x, y);
                return Ok(false);
            }
            for &z in model.neighbors(x) {
                if z != y {
                    queue.push_back((z, x));
                }
            }
        }
    }
    Ok(true)
}
