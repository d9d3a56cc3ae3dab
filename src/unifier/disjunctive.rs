//! Disjunctive piece unifiers (spec 4.6): one [`PieceUnifier`] per matched
//! head disjunct, whose partitions merge without conflict. A disjunctive
//! piece unifier need not cover every disjunct — an unmatched disjunct
//! only asserts that *some* value satisfies it, so rewriting treats its
//! variables as fresh existentials rather than requiring a query atom for
//! every branch of the head. Merging matched disjuncts' partitions is
//! delegated to [`TermPartition::merge`], which already rejects two
//! distinct constants landing in one class — since every per-disjunct
//! partition is built over the same interned query/rule terms, a
//! successful merge is exactly the "frontier instantiations agree"
//! condition spec 4.6 asks for.

use super::piece::{enumerate_piece_unifiers, PieceUnifier};
use crate::atom::Atom;
use crate::partition::TermPartition;
use crate::rule::Rule;
use crate::term::{Interner, Term, Variable};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct DisjunctivePieceUnifier {
    /// `(disjunct index, unifier)` for every head disjunct this unifier
    /// actually matched against a query atom. Disjuncts not present here
    /// are unmatched; their variables become fresh existentials at
    /// rewrite time.
    pub matched: Vec<(usize, PieceUnifier)>,
    pub partition: TermPartition,
}

impl DisjunctivePieceUnifier {
    /// Rewrite `query_atoms`: remove the matched pieces, add the rule's
    /// body, remapped through the joined partition. Body (and unmatched
    /// head-disjunct) variables not covered by the partition — because
    /// their disjunct had no corresponding query atom — become fresh
    /// variables, one per rule variable (spec 4.6 "disjunctive variant").
    pub fn rewrite(&self, query_atoms: &[Atom], rule: &Rule, interner: &Interner) -> Vec<Atom> {
        let body_atoms: Vec<Atom> = rule.body.atoms().into_iter().cloned().collect();
        let removed: HashSet<usize> = self
            .matched
            .iter()
            .flat_map(|(_, u)| u.query_atoms.iter().copied())
            .collect();

        let through_partition = |t: &Term| -> Option<Term> {
            self.partition
                .find(t)
                .map(|class| self.partition.class_members(class)[0].clone())
        };

        let remap_query_atom = |atom: &Atom| -> Atom {
            let args = atom
                .args
                .iter()
                .map(|t| through_partition(t).unwrap_or_else(|| t.clone()))
                .collect();
            Atom::new_unchecked(atom.predicate, args)
        };

        let mut fresh_for_unmatched: HashMap<Variable, Term> = HashMap::new();
        let mut remap_body_atom = |atom: &Atom| -> Atom {
            let args = atom
                .args
                .iter()
                .map(|t| {
                    through_partition(t).unwrap_or_else(|| match t {
                        Term::Variable(v) => fresh_for_unmatched
                            .entry(*v)
                            .or_insert_with(|| Term::Variable(interner.fresh("_")))
                            .clone(),
                        other => other.clone(),
                    })
                })
                .collect();
            Atom::new_unchecked(atom.predicate, args)
        };

        let mut out: Vec<Atom> = query_atoms
            .iter()
            .enumerate()
            .filter(|(i, _)| !removed.contains(i))
            .map(|(_, a)| remap_query_atom(a))
            .collect();
        out.extend(body_atoms.iter().map(|a| remap_body_atom(a)));
        out
    }
}

/// Enumerate disjunctive piece unifiers: every non-empty combination of
/// per-disjunct piece unifiers, across subsets of `rule`'s head disjuncts,
/// whose partitions merge without conflict. A disjunct with no matching
/// query atom simply has no candidate to contribute and is left out of
/// every combination — it does not block the others from matching.
pub fn enumerate_disjunctive_piece_unifiers(
    query_atoms: &[Atom],
    rule: &Rule,
) -> Vec<DisjunctivePieceUnifier> {
    let disjuncts = rule.head_disjuncts();
    let per_disjunct_candidates: Vec<Vec<PieceUnifier>> = disjuncts
        .iter()
        .map(|d| {
            let head_atoms = d.atoms();
            enumerate_piece_unifiers(query_atoms, rule, &head_atoms)
        })
        .collect();

    let matchable: Vec<usize> = (0..disjuncts.len())
        .filter(|&i| !per_disjunct_candidates[i].is_empty())
        .collect();
    if matchable.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut combo = Vec::with_capacity(matchable.len());
    combine(&per_disjunct_candidates, &matchable, 0, &mut combo, &TermPartition::new(), &mut out);
    out
}

#[allow(clippy::too_many_arguments)]
fn combine(
    candidates: &[Vec<PieceUnifier>],
    matchable: &[usize],
    depth: usize,
    combo: &mut Vec<(usize, PieceUnifier)>,
    partition: &TermPartition,
    out: &mut Vec<DisjunctivePieceUnifier>,
) {
    if depth == matchable.len() {
        if !combo.is_empty() {
            out.push(DisjunctivePieceUnifier {
                matched: combo.clone(),
                partition: partition.clone(),
            });
        }
        return;
    }
    let disjunct_idx = matchable[depth];

    // Leave this disjunct unmatched: its variables become fresh
    // existentials at rewrite time.
    combine(candidates, matchable, depth + 1, combo, partition, out);

    // Match this disjunct against each of its candidate unifiers.
    for unifier in &candidates[disjunct_idx] {
        let mut merged = partition.clone();
        if !merged.merge(&unifier.partition) {
            continue;
        }
        combo.push((disjunct_idx, unifier.clone()));
        combine(candidates, matchable, depth + 1, combo, &merged, out);
        combo.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::formula::Formula;
    use crate::term::{Interner, Term};

    fn atom(it: &Interner, name: &str, args: Vec<Term>) -> Atom {
        let p = it.intern_predicate(name, args.len());
        Atom::new_unchecked(p, args)
    }

    #[test]
    fn disjunctive_unifier_matches_a_single_disjunct_with_fresh_variable_for_the_rest() {
        // spec 8 S5: q(X) | r(Y) :- p(X,Y); query ?(X) :- q(X)
        let it = Interner::new();
        let x = Term::Variable(it.intern_variable("X"));
        let y = Term::Variable(it.intern_variable("Y"));
        let body = Formula::Atom(atom(&it, "p", vec![x.clone(), y.clone()]));
        let head = Formula::Disjunction(vec![
            Formula::Atom(atom(&it, "q", vec![x.clone()])),
            Formula::Atom(atom(&it, "r", vec![y.clone()])),
        ]);
        let rule = Rule::new(body, head).unwrap();

        let w = Term::Variable(it.intern_variable("W"));
        let query_atoms = vec![atom(&it, "q", vec![w])];

        let unifiers = enumerate_disjunctive_piece_unifiers(&query_atoms, &rule);
        assert!(!unifiers.is_empty());
        let single_disjunct = unifiers
            .iter()
            .find(|u| u.matched.len() == 1)
            .expect("a single-disjunct unifier should exist");

        let rewritten = single_disjunct.rewrite(&query_atoms, &rule, &it);
        let p = it.intern_predicate("p", 2);
        let p_atom = rewritten.iter().find(|a| a.predicate == p).expect("rewrite should add a p atom");
        // First argument is the matched disjunct's variable (bound to the
        // query's W); second is a fresh variable standing in for Y.
        assert_ne!(p_atom.args[1], y);
        assert!(matches!(p_atom.args[1], Term::Variable(_)));
    }

    #[test]
    fn disjunctive_unifier_succeeds_when_every_disjunct_has_a_match() {
        let it = Interner::new();
        let x = Term::Variable(it.intern_variable("X"));
        let y = Term::Variable(it.intern_variable("Y"));
        let body = Formula::Atom(atom(&it, "p", vec![x.clone(), y.clone()]));
        let head = Formula::Disjunction(vec![
            Formula::Atom(atom(&it, "q", vec![x.clone()])),
            Formula::Atom(atom(&it, "r", vec![y.clone()])),
        ]);
        let rule = Rule::new(body, head).unwrap();

        let a = Term::Variable(it.intern_variable("A"));
        let b = Term::Variable(it.intern_variable("B"));
        let query_atoms = vec![atom(&it, "q", vec![a]), atom(&it, "r", vec![b])];

        let unifiers = enumerate_disjunctive_piece_unifiers(&query_atoms, &rule);
        let full_cover = unifiers
            .iter()
            .find(|u| u.matched.len() == 2)
            .expect("a full-cover unifier should exist");
        assert_eq!(full_cover.matched.len(), 2);
    }

    #[test]
    fn no_candidates_when_no_disjunct_has_a_matching_query_atom() {
        let it = Interner::new();
        let x = Term::Variable(it.intern_variable("X"));
        let y = Term::Variable(it.intern_variable("Y"));
        let body = Formula::Atom(atom(&it, "p", vec![x.clone(), y.clone()]));
        let head = Formula::Disjunction(vec![
            Formula::Atom(atom(&it, "q", vec![x])),
            Formula::Atom(atom(&it, "r", vec![y])),
        ]);
        let rule = Rule::new(body, head).unwrap();

        let query_atoms = vec![atom(&it, "s", vec![Term::Variable(it.intern_variable("Z"))])];
        let unifiers = enumerate_disjunctive_piece_unifiers(&query_atoms, &rule);
        assert!(unifiers.is_empty());
    }
}
