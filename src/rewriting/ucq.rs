//! Breadth-first UCQ rewriting (spec 4.7): repeatedly apply piece
//! unifiers (plain or disjunctive) to every CQ in the current frontier,
//! keeping only non-subsumed results, until the frontier is dry or a
//! step limit is hit.

use super::subsumption::subsumes;
use crate::atom::Atom;
use crate::rule::Rule;
use crate::term::{Interner, Variable};
use crate::unifier::enumerate_disjunctive_piece_unifiers;

/// A conjunctive query as the rewriter sees it: an atom list plus the
/// answer variables that must stay meaningful across every rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConjunctiveQuery {
    pub answer_vars: Vec<Variable>,
    pub atoms: Vec<Atom>,
}

/// Rewrite `query` against `rules`, producing `UCQ(Q, R)` (spec 4.7).
/// `step_limit == 0` means unlimited rounds.
pub fn rewrite_ucq(
    query: &ConjunctiveQuery,
    rules: &[Rule],
    interner: &Interner,
    step_limit: usize,
) -> Vec<ConjunctiveQuery> {
    let mut output = vec![query.clone()];
    let mut frontier = vec![query.clone()];
    let mut round = 0usize;

    loop {
        if step_limit != 0 && round >= step_limit {
            break;
        }
        round += 1;
        let mut new_frontier = Vec::new();

        for q in &frontier {
            for rule in rules {
                for du in enumerate_disjunctive_piece_unifiers(&q.atoms, rule) {
                    let candidate = ConjunctiveQuery {
                        answer_vars: q.answer_vars.clone(),
                        atoms: du.rewrite(&q.atoms, rule, interner),
                    };
                    let is_subsumed = output.iter().any(|existing| {
                        subsumes(
                            &candidate.atoms,
                            &candidate.answer_vars,
                            &existing.atoms,
                            &existing.answer_vars,
                            interner,
                        )
                    });
                    if is_subsumed {
                        continue;
                    }
                    output.push(candidate.clone());
                    new_frontier.push(candidate);
                }
            }
        }

        if new_frontier.is_empty() {
            break;
        }
        frontier = new_frontier;
    }
    output
}
