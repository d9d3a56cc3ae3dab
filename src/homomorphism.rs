//! Backtracking homomorphism search over a conjunction of atoms against a
//! [`ReadableData`] source (spec 4.3).
//!
//! A homomorphism from a conjunctive query into a fact base is found atom
//! by atom: each atom is turned into a [`BasicQuery`] against the current
//! partial substitution (already-bound positions become bound positions,
//! still-free positions become answer positions), the source is probed,
//! and every returned tuple that is consistent with the running
//! substitution spawns one branch of the search tree. The `AtomScheduler`
//! decides which remaining atom to probe next; `StaticScheduler` keeps
//! the conjunction's written order, `DynamicScheduler` reorders by
//! estimated selectivity at every step (spec 4.3, "static vs dynamic
//! atom-ordering schedulers").

use crate::atom::Atom;
use crate::data_source::{BasicQuery, ReadableData};
use crate::error::EngineError;
use crate::substitution::Substitution;
use crate::term::{Interner, Term, Variable};
use std::collections::HashSet;
use std::fmt;

/// Decides which of the remaining atoms to probe next during the search.
pub trait AtomScheduler: fmt::Debug {
    /// `remaining` is a set of indices into the original atom list.
    /// Returns one of those indices.
    fn pick_next(
        &self,
        atoms: &[Atom],
        remaining: &[usize],
        subst: &Substitution,
        source: &dyn ReadableData,
        interner: &Interner,
    ) -> usize;
}

/// Probes atoms in the order they were written (spec 4.3 "static").
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticScheduler;

impl AtomScheduler for StaticScheduler {
    fn pick_next(
        &self,
        _atoms: &[Atom],
        remaining: &[usize],
        _subst: &Substitution,
        _source: &dyn ReadableData,
        _interner: &Interner,
    ) -> usize {
        remaining[0]
    }
}

/// At each step, builds the `BasicQuery` every remaining atom would probe
/// with and picks the one with the smallest `estimate_bound` (spec 4.3
/// "dynamic": reorder joins by estimated selectivity). Unknown estimates
/// (`None`) are treated as maximally expensive so atoms with a real
/// estimate are always preferred.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicScheduler;

impl AtomScheduler for DynamicScheduler {
    fn pick_next(
        &self,
        atoms: &[Atom],
        remaining: &[usize],
        subst: &Substitution,
        source: &dyn ReadableData,
        interner: &Interner,
    ) -> usize {
        remaining
            .iter()
            .copied()
            .min_by_key(|&idx| {
                let (query, _) = build_basic_query(&atoms[idx], subst, interner);
                source.estimate_bound(&query).unwrap_or(usize::MAX)
            })
            .unwrap_or(remaining[0])
    }
}

/// Build the `BasicQuery` for `atom` under the current substitution: a
/// position whose substituted term is ground becomes a bound position;
/// any other position gets a synthetic answer variable, paired with the
/// (possibly partially-bound) pattern term it must eventually match
/// against whatever the source returns there.
fn build_basic_query(
    atom: &Atom,
    subst: &Substitution,
    interner: &Interner,
) -> (BasicQuery, Vec<(usize, Term)>) {
    let mut query = BasicQuery::new(atom.predicate);
    let mut patterns = Vec::new();
    for (pos, arg) in atom.args.iter().enumerate() {
        let applied = subst.apply_term(arg);
        if applied.is_ground() {
            query = query.with_bound(pos, applied);
        } else {
            let synthetic = interner.fresh("hom");
            query = query.with_answer(pos, synthetic);
            patterns.push((pos, applied));
        }
    }
    patterns.sort_by_key(|(pos, _)| *pos);
    (query, patterns)
}

/// Match a (possibly non-ground) pattern term against a ground-ish value
/// term returned by a source, extending `subst` consistently. Unlike
/// unification this is one-directional: only `pattern`'s variables get
/// bound (spec 4.3, homomorphism rather than isomorphism).
fn match_term(pattern: &Term, value: &Term, subst: &Substitution) -> Option<Substitution> {
    match pattern {
        Term::Variable(v) => subst.extend_consistent(*v, value.clone()),
        Term::Constant(_) | Term::Literal(_) => {
            if pattern == value {
                Some(subst.clone())
            } else {
                None
            }
        }
        Term::LogicalFunctionTerm(f, args) | Term::EvaluableFunctionTerm(f, args) => match value {
            Term::LogicalFunctionTerm(vf, vargs) | Term::EvaluableFunctionTerm(vf, vargs)
                if vf == f && vargs.len() == args.len() =>
            {
                let mut acc = subst.clone();
                for (p, v) in args.iter().zip(vargs) {
                    acc = match_term(p, v, &acc)?;
                }
                Some(acc)
            }
            _ => None,
        },
    }
}

/// Find every substitution mapping the free variables of `atoms` into
/// `source` such that every atom, once substituted, is present in (or
/// accepted by) the source (spec 4.3).
///
/// `seed` is the substitution to extend (empty for a fresh search; a
/// partial binding when homomorphism search is resumed, e.g. by the
/// piece-unifier's frontier-fixed variant).
pub fn find_homomorphisms(
    atoms: &[Atom],
    source: &dyn ReadableData,
    interner: &Interner,
    scheduler: &dyn AtomScheduler,
    seed: &Substitution,
) -> Result<Vec<Substitution>, EngineError> {
    let remaining: Vec<usize> = (0..atoms.len()).collect();
    let mut results = Vec::new();
    search_step(atoms, &remaining, seed, source, interner, scheduler, &mut results)?;
    Ok(results)
}

#[allow(clippy::too_many_arguments)]
fn search_step(
    atoms: &[Atom],
    remaining: &[usize],
    subst: &Substitution,
    source: &dyn ReadableData,
    interner: &Interner,
    scheduler: &dyn AtomScheduler,
    results: &mut Vec<Substitution>,
) -> Result<(), EngineError> {
    if remaining.is_empty() {
        results.push(subst.clone());
        return Ok(());
    }

    let chosen = scheduler.pick_next(atoms, remaining, subst, source, interner);
    let next_remaining: Vec<usize> = remaining.iter().copied().filter(|&i| i != chosen).collect();

    let (query, patterns) = build_basic_query(&atoms[chosen], subst, interner);
    let answer_order = query.ordered_answer_positions();
    let candidates: Vec<Vec<Term>> = source.evaluate(&query)?.collect();
    #[cfg(feature = "trace-search")]
    tracing::trace!(
        atom = chosen,
        predicate = interner.predicate_name(atoms[chosen].predicate),
        candidates = candidates.len(),
        "homomorphism search: atom matched"
    );

    for tuple in candidates {
        debug_assert_eq!(tuple.len(), answer_order.len());
        let mut extended = Some(subst.clone());
        for (value, (_, pattern)) in tuple.iter().zip(patterns.iter()) {
            extended = match extended {
                Some(s) => match_term(pattern, value, &s),
                None => None,
            };
            if extended.is_none() {
                break;
            }
        }
        if let Some(next_subst) = extended {
            search_step(atoms, &next_remaining, &next_subst, source, interner, scheduler, results)?;
        }
    }
    Ok(())
}

/// Whether `atoms` (as a conjunction) has at least one homomorphism into
/// `source` — a boolean query, short-circuiting on the first match.
pub fn has_homomorphism(
    atoms: &[Atom],
    source: &dyn ReadableData,
    interner: &Interner,
    scheduler: &dyn AtomScheduler,
) -> Result<bool, EngineError> {
    // Cheap reuse of the general search; prototyping scale (spec 2) does
    // not warrant a separate short-circuiting traversal.
    Ok(!find_homomorphisms(atoms, source, interner, scheduler, &Substitution::new())?.is_empty())
}

/// Free variables across a conjunction of atoms, deduplicated in
/// first-occurrence order.
pub fn conjunction_free_variables(atoms: &[Atom]) -> Vec<Variable> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for atom in atoms {
        for v in atom.free_variables() {
            if seen.insert(v) {
                out.push(v);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact_base::FactBase;
    use crate::term::Interner;

    fn edge(it: &Interner, fb: &mut FactBase, a: &str, b: &str) {
        let p = it.intern_predicate("edge", 2);
        let a = Term::Constant(it.intern_constant(a));
        let b = Term::Constant(it.intern_constant(b));
        fb.add(p, vec![a, b]);
    }

    #[test]
    fn finds_a_path_of_two_edges() {
        // spec 8, invariant 5 (soundness/completeness)
        let mut it = Interner::new();
        let mut fb = FactBase::new("facts");
        edge(&mut it, &mut fb, "a", "b");
        edge(&mut it, &mut fb, "b", "c");

        let p = it.intern_predicate("edge", 2);
        let x = it.intern_variable("X");
        let y = it.intern_variable("Y");
        let z = it.intern_variable("Z");
        let atoms = vec![
            Atom::new_unchecked(p, vec![Term::Variable(x), Term::Variable(y)]),
            Atom::new_unchecked(p, vec![Term::Variable(y), Term::Variable(z)]),
        ];

        let results = find_homomorphisms(
            &atoms,
            &fb,
            &mut it,
            &StaticScheduler,
            &Substitution::new(),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        let s = &results[0];
        assert_eq!(it.constant_name(match s.get(x).unwrap() {
            Term::Constant(c) => *c,
            _ => unreachable!(),
        }), "a");
    }

    #[test]
    fn no_homomorphism_when_chain_is_broken() {
        let mut it = Interner::new();
        let mut fb = FactBase::new("facts");
        edge(&mut it, &mut fb, "a", "b");

        let p = it.intern_predicate("edge", 2);
        let x = it.intern_variable("X");
        let y = it.intern_variable("Y");
        let z = it.intern_variable("Z");
        let atoms = vec![
            Atom::new_unchecked(p, vec![Term::Variable(x), Term::Variable(y)]),
            Atom::new_unchecked(p, vec![Term::Variable(y), Term::Variable(z)]),
        ];

        assert!(!has_homomorphism(&atoms, &fb, &mut it, &StaticScheduler).unwrap());
    }

    #[test]
    fn repeated_variable_forces_self_loop() {
        let mut it = Interner::new();
        let mut fb = FactBase::new("facts");
        edge(&mut it, &mut fb, "a", "b");
        edge(&mut it, &mut fb, "a", "a");

        let p = it.intern_predicate("edge", 2);
        let x = it.intern_variable("X");
        let atoms = vec![Atom::new_unchecked(p, vec![Term::Variable(x), Term::Variable(x)])];

        let results =
            find_homomorphisms(&atoms, &fb, &mut it, &StaticScheduler, &Substitution::new())
                .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn dynamic_scheduler_agrees_with_static_on_result_set() {
        let mut it = Interner::new();
        let mut fb = FactBase::new("facts");
        edge(&mut it, &mut fb, "a", "b");
        edge(&mut it, &mut fb, "b", "c");
        edge(&mut it, &mut fb, "c", "d");

        let p = it.intern_predicate("edge", 2);
        let x = it.intern_variable("X");
        let y = it.intern_variable("Y");
        let z = it.intern_variable("Z");
        let atoms = vec![
            Atom::new_unchecked(p, vec![Term::Variable(x), Term::Variable(y)]),
            Atom::new_unchecked(p, vec![Term::Variable(y), Term::Variable(z)]),
        ];

        let mut it2 = Interner::new();
        let mut fb2 = FactBase::new("facts");
        edge(&mut it2, &mut fb2, "a", "b");
        edge(&mut it2, &mut fb2, "b", "c");
        edge(&mut it2, &mut fb2, "c", "d");
        let p2 = it2.intern_predicate("edge", 2);
        let x2 = it2.intern_variable("X");
        let y2 = it2.intern_variable("Y");
        let z2 = it2.intern_variable("Z");
        let atoms2 = vec![
            Atom::new_unchecked(p2, vec![Term::Variable(x2), Term::Variable(y2)]),
            Atom::new_unchecked(p2, vec![Term::Variable(y2), Term::Variable(z2)]),
        ];

        let static_results =
            find_homomorphisms(&atoms, &fb, &mut it, &StaticScheduler, &Substitution::new())
                .unwrap();
        let dynamic_results =
            find_homomorphisms(&atoms2, &fb2, &mut it2, &DynamicScheduler, &Substitution::new())
                .unwrap();
        assert_eq!(static_results.len(), dynamic_results.len());
    }
}
