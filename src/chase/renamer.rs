//! Existential renaming (spec 4.10 step 4): once a trigger has fired,
//! bind each existential head variable to a witness term. The strategy
//! controls how that witness is chosen.

use serde::{Deserialize, Serialize};
use crate::rule::Rule;
use crate::substitution::Substitution;
use crate::term::{Interner, Term, Variable};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenamerStrategy {
    /// A brand new, never-reused labeled null per occurrence. Cheapest,
    /// but loses comparability across triggers — two triggers with
    /// identical frontier bindings get different witnesses.
    Fresh,
    /// One witness per existential variable, keyed on the rule and the
    /// full body substitution.
    BodySkolem,
    /// One witness per existential variable, keyed on the rule and only
    /// the frontier-variable bindings (spec's standard skolemization).
    FrontierSkolem,
    /// Existential variables are grouped into pieces (connected via
    /// shared head-atom co-occurrence); all variables in the same piece
    /// share one witness per frontier binding, rather than getting one
    /// witness each.
    FrontierByPieceSkolem,
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Group a rule's existential variables into pieces: two existential
/// variables are in the same piece iff they co-occur in some head atom
/// (transitively). Mirrors the piece decomposition `unifier` uses for
/// existential closure, but over the rule's own head rather than a
/// query.
fn existential_pieces(rule: &Rule) -> Vec<Vec<Variable>> {
    let existentials = rule.existential_variables();
    let index_of: HashMap<Variable, usize> = existentials.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let mut uf = UnionFind::new(existentials.len());

    for disjunct in rule.head_disjuncts() {
        for atom in disjunct.atoms() {
            let members: Vec<usize> = atom
                .args
                .iter()
                .filter_map(|t| match t {
                    Term::Variable(v) => index_of.get(v).copied(),
                    _ => None,
                })
                .collect();
            for w in members.windows(2) {
                uf.union(w[0], w[1]);
            }
        }
    }

    let mut groups: HashMap<usize, Vec<Variable>> = HashMap::new();
    for (i, &v) in existentials.iter().enumerate() {
        let root = uf.find(i);
        groups.entry(root).or_default().push(v);
    }
    groups.into_values().collect()
}

fn frontier_key(rule: &Rule, rule_id: usize, body_subst: &Substitution, interner: &Interner) -> String {
    let mut entries: Vec<(Variable, String)> = rule
        .frontier_variables()
        .into_iter()
        .map(|v| (v, format!("{:?}", body_subst.apply_term(&Term::Variable(v)))))
        .collect();
    entries.sort();
    let _ = interner;
    format!("{}|{:?}", rule_id, entries)
}

fn body_key(rule_id: usize, body_subst: &Substitution) -> String {
    let mut entries: Vec<(Variable, Term)> = body_subst.iter().map(|(v, t)| (v, t.clone())).collect();
    entries.sort_by_key(|(v, _)| *v);
    format!("{}|{:?}", rule_id, entries)
}

/// Produce a substitution binding every existential variable of `rule` to
/// a witness term, given the substitution over `rule`'s frontier/body
/// produced by the trigger that fired.
pub fn rename_existentials(
    rule: &Rule,
    rule_id: usize,
    body_subst: &Substitution,
    strategy: RenamerStrategy,
    interner: &Interner,
) -> Substitution {
    let mut out = Substitution::new();
    match strategy {
        RenamerStrategy::Fresh => {
            for v in rule.existential_variables() {
                let hint = interner.variable_name(v);
                out.bind(v, Term::Variable(interner.fresh(&hint)));
            }
        }
        RenamerStrategy::BodySkolem => {
            let key = body_key(rule_id, body_subst);
            for v in rule.existential_variables() {
                let witness_key = format!("{}|{:?}", key, v);
                out.bind(v, Term::Constant(interner.intern_constant(&witness_key)));
            }
        }
        RenamerStrategy::FrontierSkolem => {
            let key = frontier_key(rule, rule_id, body_subst, interner);
            for v in rule.existential_variables() {
                let witness_key = format!("{}|{:?}", key, v);
                out.bind(v, Term::Constant(interner.intern_constant(&witness_key)));
            }
        }
        RenamerStrategy::FrontierByPieceSkolem => {
            let key = frontier_key(rule, rule_id, body_subst, interner);
            for piece in existential_pieces(rule) {
                let mut piece_sorted = piece.clone();
                piece_sorted.sort();
                let witness_key = format!("{}|piece{:?}", key, piece_sorted);
                let witness = Term::Constant(interner.intern_constant(&witness_key));
                for v in piece {
                    out.bind(v, witness.clone());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::formula::Formula;
    use crate::term::Interner;

    fn atom(it: &Interner, name: &str, args: Vec<Term>) -> Atom {
        let p = it.intern_predicate(name, args.len());
        Atom::new_unchecked(p, args)
    }

    fn existential_rule(it: &Interner) -> Rule {
        let x = Term::Variable(it.intern_variable("X"));
        let y = Term::Variable(it.intern_variable("Y"));
        Rule::new(
            Formula::Atom(atom(it, "p", vec![x.clone()])),
            Formula::Existential(
                vec![it.intern_variable("Y")],
                Box::new(Formula::Atom(atom(it, "q", vec![x, y]))),
            ),
        )
        .unwrap()
    }

    #[test]
    fn frontier_skolem_gives_the_same_witness_for_the_same_binding() {
        let it = Interner::new();
        let rule = existential_rule(&it);
        let x = it.intern_variable("X");
        let a = Term::Constant(it.intern_constant("a"));
        let body_subst = Substitution::singleton(x, a);

        let s1 = rename_existentials(&rule, 0, &body_subst, RenamerStrategy::FrontierSkolem, &it);
        let s2 = rename_existentials(&rule, 0, &body_subst, RenamerStrategy::FrontierSkolem, &it);
        let y = it.intern_variable("Y");
        assert_eq!(s1.get(y), s2.get(y));
    }

    #[test]
    fn fresh_gives_different_witnesses_across_calls() {
        let it = Interner::new();
        let rule = existential_rule(&it);
        let x = it.intern_variable("X");
        let a = Term::Constant(it.intern_constant("a"));
        let body_subst = Substitution::singleton(x, a);

        let s1 = rename_existentials(&rule, 0, &body_subst, RenamerStrategy::Fresh, &it);
        let s2 = rename_existentials(&rule, 0, &body_subst, RenamerStrategy::Fresh, &it);
        let y = it.intern_variable("Y");
        assert_ne!(s1.get(y), s2.get(y));
    }

    #[test]
    fn pieces_share_one_witness_per_connected_component() {
        let it = Interner::new();
        let x = Term::Variable(it.intern_variable("X"));
        let y1 = it.intern_variable("Y1");
        let y2 = it.intern_variable("Y2");
        let rule = Rule::new(
            Formula::Atom(atom(&it, "p", vec![x.clone()])),
            Formula::Existential(
                vec![y1, y2],
                Box::new(Formula::Atom(atom(&it, "q", vec![x, Term::Variable(y1), Term::Variable(y2)]))),
            ),
        )
        .unwrap();
        let pieces = existential_pieces(&rule);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].len(), 2);
    }
}
