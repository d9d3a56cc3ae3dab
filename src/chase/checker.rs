//! Trigger checkers (spec 4.10 step 3): decide whether a computed trigger
//! has already fired and should be skipped. Checking happens before
//! renaming (step 4), so existential head variables are never bound yet —
//! keys below are built from the body substitution only.

use crate::rule::Rule;
use crate::substitution::Substitution;
use crate::term::{Term, Variable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckerKind {
    /// Never skip; every trigger fires every time it's computed.
    Oblivious,
    /// Skip a trigger whose frontier-variable bindings were already seen.
    SemiOblivious,
    /// Like `SemiOblivious`, but also requires the trigger to use at
    /// least one recently-created fact (checked by the caller via
    /// `touched`; this checker only tracks the seen-key half).
    Restricted,
    /// Broadest key: the full body-substitution bindings. Stands in for
    /// "equivalent head image" since existentials aren't bound yet.
    Equivalent,
    /// Runs several kinds at once; a trigger is skipped if ANY sub-kind
    /// would skip it.
    Multi(Vec<CheckerKind>),
}

fn sorted_bindings(subst: &Substitution, vars: &[Variable]) -> Vec<(Variable, Term)> {
    let mut entries: Vec<(Variable, Term)> = vars
        .iter()
        .filter_map(|&v| subst.get(v).map(|t| (v, t.clone())))
        .collect();
    entries.sort_by_key(|(v, _)| *v);
    entries
}

fn key_string(entries: &[(Variable, Term)]) -> String {
    format!("{:?}", entries)
}

fn semi_oblivious_key(rule: &Rule, rule_index: usize, subst: &Substitution) -> String {
    let entries = sorted_bindings(subst, &rule.frontier_variables());
    format!("{}|{}", rule_index, key_string(&entries))
}

fn equivalent_key(rule: &Rule, rule_index: usize, subst: &Substitution) -> String {
    let vars = rule.body.free_variables();
    let entries = sorted_bindings(subst, &vars);
    format!("{}|{}", rule_index, key_string(&entries))
}

/// Mutable state a [`CheckerKind`] consults and updates across chase steps.
#[derive(Debug, Default)]
pub struct CheckerState {
    semi_oblivious_seen: HashSet<String>,
    equivalent_seen: HashSet<String>,
}

impl CheckerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the trigger should fire (i.e. was not already
    /// seen under `kind`'s key). Recording a new key is a side effect of
    /// calling this, so each trigger must be checked exactly once.
    pub fn should_fire(&mut self, kind: CheckerKind, rule: &Rule, rule_index: usize, subst: &Substitution) -> bool {
        match kind {
            CheckerKind::Oblivious => true,
            CheckerKind::SemiOblivious | CheckerKind::Restricted => {
                self.semi_oblivious_seen.insert(semi_oblivious_key(rule, rule_index, subst))
            }
            CheckerKind::Equivalent => self.equivalent_seen.insert(equivalent_key(rule, rule_index, subst)),
            CheckerKind::Multi(kinds) => {
                // Evaluate every sub-kind (no short-circuit) so each one's
                // seen-set stays consistent regardless of the others' verdicts.
                let mut fire = true;
                for k in kinds {
                    if !self.should_fire(k.clone(), rule, rule_index, subst) {
                        fire = false;
                    }
                }
                fire
            }
        }
    }
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

    fn simple_rule(it: &Interner) -> Rule {
        let x = Term::Variable(it.intern_variable("X"));
        Rule::new(
            Formula::Atom(atom(it, "p", vec![x.clone()])),
            Formula::Atom(atom(it, "q", vec![x])),
        )
        .unwrap()
    }

    #[test]
    fn oblivious_always_fires() {
        let it = Interner::new();
        let rule = simple_rule(&it);
        let mut state = CheckerState::new();
        let x = it.intern_variable("X");
        let a = Term::Constant(it.intern_constant("a"));
        let subst = Substitution::singleton(x, a);
        assert!(state.should_fire(CheckerKind::Oblivious, &rule, 0, &subst));
        assert!(state.should_fire(CheckerKind::Oblivious, &rule, 0, &subst));
    }

    #[test]
    fn semi_oblivious_skips_a_repeated_frontier_binding() {
        let it = Interner::new();
        let rule = simple_rule(&it);
        let mut state = CheckerState::new();
        let x = it.intern_variable("X");
        let a = Term::Constant(it.intern_constant("a"));
        let subst = Substitution::singleton(x, a);
        assert!(state.should_fire(CheckerKind::SemiOblivious, &rule, 0, &subst));
        assert!(!state.should_fire(CheckerKind::SemiOblivious, &rule, 0, &subst));
    }

    #[test]
    fn multi_skips_if_any_sub_checker_would_skip() {
        let it = Interner::new();
        let rule = simple_rule(&it);
        let mut state = CheckerState::new();
        let x = it.intern_variable("X");
        let a = Term::Constant(it.intern_constant("a"));
        let subst = Substitution::singleton(x, a);
        let kinds = vec![CheckerKind::SemiOblivious, CheckerKind::Equivalent];
        assert!(state.should_fire(CheckerKind::Multi(kinds.clone()), &rule, 0, &subst));
        assert!(!state.should_fire(CheckerKind::Multi(kinds), &rule, 0, &subst));
    }
}
