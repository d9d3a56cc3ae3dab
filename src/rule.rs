//! Rules and their fragment validators (spec 3).
//!
//! `Rule{body, head}`. Free variables of `head` must be a subset of
//! `free(body) ∪ ∃-bound(head)`. The fragment validators below are
//! external check functions, not part of the `Rule` constructor itself —
//! a caller picks the validator appropriate to the fragment it claims to
//! support (plain CQ rules, existential rules, disjunctive-existential
//! rules, rules with safe negation).

use crate::formula::Formula;
use crate::term::Variable;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub body: Formula,
    pub head: Formula,
}

impl Rule {
    /// Construct a rule, checking the frontier-containment invariant.
    pub fn new(body: Formula, head: Formula) -> Result<Self, String> {
        let rule = Rule { body, head };
        if let Err(e) = rule.check_frontier() {
            return Err(e);
        }
        Ok(rule)
    }

    fn check_frontier(&self) -> Result<(), String> {
        let body_vars: HashSet<Variable> = self.body.free_variables().into_iter().collect();
        let existential_vars: HashSet<Variable> = existential_bound_vars(&self.head).into_iter().collect();
        let head_vars = self.head.free_variables();
        for v in head_vars {
            if !body_vars.contains(&v) && !existential_vars.contains(&v) {
                return Err(format!(
                    "head variable {v:?} is neither bound by the body nor \
                     existentially quantified in the head"
                ));
            }
        }
        Ok(())
    }

    /// Frontier variables: variables shared between body and head — the
    /// ones a skolem renamer keys on for `frontier-skolem` (spec 4.10).
    pub fn frontier_variables(&self) -> Vec<Variable> {
        let body_vars: HashSet<Variable> = self.body.free_variables().into_iter().collect();
        self.head
            .free_variables()
            .into_iter()
            .filter(|v| body_vars.contains(v))
            .collect()
    }

    /// Existential variables of the head (those bound by an `Existential`
    /// node inside it, or — for an unwrapped head — head-only variables
    /// not shared with the body).
    pub fn existential_variables(&self) -> Vec<Variable> {
        let explicit = existential_bound_vars(&self.head);
        if !explicit.is_empty() {
            return explicit;
        }
        let body_vars: HashSet<Variable> = self.body.free_variables().into_iter().collect();
        self.head
            .free_variables()
            .into_iter()
            .filter(|v| !body_vars.contains(v))
            .collect()
    }

    /// The head's disjuncts: a plain/existential head is a single
    /// disjunct; a `Disjunction` head (optionally wrapped by
    /// `Existential`) yields one disjunct per branch.
    pub fn head_disjuncts(&self) -> Vec<&Formula> {
        match strip_existential(&self.head) {
            Formula::Disjunction(parts) => parts.iter().collect(),
            other => vec![other],
        }
    }

    pub fn is_disjunctive(&self) -> bool {
        matches!(strip_existential(&self.head), Formula::Disjunction(_))
    }

    pub fn is_existential(&self) -> bool {
        !self.existential_variables().is_empty()
    }
}

fn strip_existential(f: &Formula) -> &Formula {
    match f {
        Formula::Existential(_, inner) => strip_existential(inner),
        other => other,
    }
}

fn existential_bound_vars(f: &Formula) -> Vec<Variable> {
    match f {
        Formula::Existential(vars, inner) => {
            let mut out = vars.clone();
            out.extend(existential_bound_vars(inner));
            out
        }
        _ => Vec::new(),
    }
}

/// Body variables bound only through positive (non-negated) atoms —
/// needed by the safety validator.
fn positive_body_variables(body: &Formula) -> HashSet<Variable> {
    let mut out = HashSet::new();
    collect_positive_vars(body, &mut out);
    out
}

fn collect_positive_vars(f: &Formula, out: &mut HashSet<Variable>) {
    match f {
        Formula::Atom(a) => out.extend(a.free_variables()),
        Formula::Conjunction(parts) | Formula::Disjunction(parts) => {
            for p in parts {
                collect_positive_vars(p, out);
            }
        }
        Formula::Negation(_) => {} // negated atoms don't contribute positively
        Formula::Existential(_, inner) | Formula::Universal(_, inner) => {
            collect_positive_vars(inner, out)
        }
    }
}

/// A rule whose head is a single conjunction of atoms with no existential
/// or disjunctive structure.
pub fn is_plain_conjunctive(rule: &Rule) -> bool {
    !rule.is_disjunctive() && rule.existential_variables().is_empty()
}

/// A rule whose head may introduce existential variables but is not
/// disjunctive.
pub fn is_existential_rule(rule: &Rule) -> bool {
    !rule.is_disjunctive()
}

/// A rule whose head may be disjunctive and/or existential — the most
/// general fragment this engine supports (spec 1).
pub fn is_disjunctive_existential_rule(_rule: &Rule) -> bool {
    true
}

/// Every free variable of the body appears in a positive (non-negated)
/// atom: the classical Datalog safety condition, extended to negation
/// (spec 7 `UnsafeNegationWarning` covers the *query-time* version of
/// this; this validator is the *rule-definition-time* version).
pub fn is_safely_negated(rule: &Rule) -> bool {
    let all_vars: HashSet<Variable> = rule.body.free_variables().into_iter().collect();
    let positive_vars = positive_body_variables(&rule.body);
    all_vars.iter().all(|v| positive_vars.contains(v))
}
