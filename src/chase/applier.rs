//! Rule application (spec 4.10 step 6): render a fired, renamed trigger's
//! head atoms into the fact base.
//!
//! Disjunctive heads are rendered as the union of every disjunct's atoms
//! rather than branched over nondeterministically — the spec's sound
//! mechanism for disjunction is backward-chaining UCQ rewriting, already
//! covered by [`crate::rewriting`]; this forward applier only needs to be
//! a safe over-approximation for the existential/non-disjunctive core to
//! stay correct.

use serde::{Deserialize, Serialize};
use crate::data_source::DatalogDelegable;
use crate::error::EngineError;
use crate::fact_base::{FactBase, GroundAtom};
use crate::rule::Rule;
use crate::substitution::Substitution;
use parking_lot::Mutex;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplierStrategy {
    /// Render and apply every trigger on the calling thread, in order.
    BreadthFirst,
    /// Render atoms in parallel, then apply them on the calling thread.
    Parallel,
    /// Render and apply concurrently under a shared lock.
    MultiThread,
    /// Hand the rule set off to a [`DatalogDelegable`] data source instead
    /// of rendering locally.
    SourceDelegated,
}

/// Render one fired trigger's head atoms under the combined
/// body+existential substitution.
pub fn render_trigger(rule: &Rule, subst: &Substitution) -> Vec<GroundAtom> {
    rule.head_disjuncts()
        .into_iter()
        .flat_map(|d| d.atoms())
        .map(|atom| {
            let args = atom.args.iter().map(|t| subst.apply_term(t)).collect();
            (atom.predicate, args)
        })
        .collect()
}

/// Applies a batch of `(rule, substitution)` pairs, returning the set of
/// newly-added atoms (atoms the fact base didn't already contain).
pub fn apply_breadth_first(facts: &mut FactBase, fired: &[(&Rule, Substitution)]) -> Vec<GroundAtom> {
    let mut added = Vec::new();
    for (rule, subst) in fired {
        for (predicate, args) in render_trigger(rule, subst) {
            if facts.add(predicate, args.clone()) {
                added.push((predicate, args));
            }
        }
    }
    added
}

pub fn apply_parallel(facts: &mut FactBase, fired: &[(&Rule, Substitution)]) -> Vec<GroundAtom> {
    let rendered: Vec<GroundAtom> = fired
        .par_iter()
        .flat_map(|(rule, subst)| render_trigger(rule, subst))
        .collect();
    let mut added = Vec::new();
    for (predicate, args) in rendered {
        if facts.add(predicate, args.clone()) {
            added.push((predicate, args));
        }
    }
    added
}

/// Fully concurrent render-and-apply under a shared mutex. A lock around
/// fact-base mutation keeps the *set* of resulting facts deterministic;
/// the order in which they're inserted is not.
pub fn apply_multi_thread(facts: &Mutex<FactBase>, fired: &[(&Rule, Substitution)]) -> Vec<GroundAtom> {
    let added: Mutex<Vec<GroundAtom>> = Mutex::new(Vec::new());
    fired.par_iter().for_each(|(rule, subst)| {
        for (predicate, args) in render_trigger(rule, subst) {
            let inserted = facts.lock().add(predicate, args.clone());
            if inserted {
                added.lock().push((predicate, args));
            }
        }
    });
    added.into_inner()
}

pub fn apply_source_delegated(source: &dyn DatalogDelegable, rule_ids: &[usize]) -> Result<(), EngineError> {
    source.delegate_rules(rule_ids)
}
