//! Trigger computation (spec 4.10 step 2): substitutions over a rule's
//! body, evaluated as a conjunctive query against the current facts.
//! Negated body atoms are checked directly against the fact base rather
//! than through homomorphism search — safe because the chase only
//! reaches a rule with a negated atom over predicate `p` once `p`'s
//! producing stratum has already saturated (spec 4.9/4.10).

use serde::{Deserialize, Serialize};
use crate::atom::Atom;
use crate::error::EngineError;
use crate::fact_base::{FactBase, GroundAtom};
use crate::formula::Formula;
use crate::homomorphism::{find_homomorphisms, StaticScheduler};
use crate::rule::Rule;
use crate::substitution::Substitution;
use crate::term::{Interner, Term, Variable};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Trigger {
    pub rule_index: usize,
    pub substitution: Substitution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerComputer {
    Naive,
    Restricted,
    SemiNaive,
    TwoSteps,
}

fn split_body_atoms(body: &Formula) -> (Vec<Atom>, Vec<Atom>) {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    collect(body, false, &mut positive, &mut negative);
    return (positive, negative);

    fn collect(f: &Formula, negated: bool, positive: &mut Vec<Atom>, negative: &mut Vec<Atom>) {
        match f {
            Formula::Atom(a) => {
                if negated {
                    negative.push(a.clone());
                } else {
                    positive.push(a.clone());
                }
            }
            Formula::Conjunction(parts) | Formula::Disjunction(parts) => {
                for p in parts {
                    collect(p, negated, positive, negative);
                }
            }
            Formula::Negation(inner) => collect(inner, true, positive, negative),
            Formula::Existential(_, inner) | Formula::Universal(_, inner) => {
                collect(inner, negated, positive, negative)
            }
        }
    }
}

fn negation_satisfied(negative: &[Atom], subst: &Substitution, facts: &FactBase) -> bool {
    negative.iter().all(|atom| {
        let args: Vec<Term> = atom.args.iter().map(|t| subst.apply_term(t)).collect();
        !facts.contains(atom.predicate, &args)
    })
}

fn naive_triggers(
    rule: &Rule,
    rule_index: usize,
    facts: &FactBase,
    interner: &Interner,
) -> Result<Vec<Trigger>, EngineError> {
    let (positive, negative) = split_body_atoms(&rule.body);
    let substs = find_homomorphisms(&positive, facts, interner, &StaticScheduler, &Substitution::new())?;
    Ok(substs
        .into_iter()
        .filter(|s| negation_satisfied(&negative, s, facts))
        .map(|substitution| Trigger { rule_index, substitution })
        .collect())
}

/// Only the homomorphisms among `naive_triggers` that use at least one
/// fact from `delta` (spec 4.10: `restricted`/`two-steps`; this engine
/// implements both the same way — they differ only in when the delta set
/// is materialized, which doesn't change the result at this scale).
fn restricted_triggers(
    rule: &Rule,
    rule_index: usize,
    facts: &FactBase,
    delta: &HashSet<GroundAtom>,
    interner: &Interner,
) -> Result<Vec<Trigger>, EngineError> {
    let (positive, _) = split_body_atoms(&rule.body);
    let naive = naive_triggers(rule, rule_index, facts, interner)?;
    Ok(naive
        .into_iter()
        .filter(|t| {
            positive.iter().any(|atom| {
                let args: Vec<Term> = atom.args.iter().map(|ar| t.substitution.apply_term(ar)).collect();
                delta.contains(&(atom.predicate, args))
            })
        })
        .collect())
}

fn binding_key(subst: &Substitution) -> Vec<(Variable, Term)> {
    let mut entries: Vec<(Variable, Term)> = subst.iter().map(|(v, t)| (v, t.clone())).collect();
    entries.sort_by_key(|(v, _)| *v);
    entries
}

/// Semi-naive delta-based enumeration: for each positive body atom `i`,
/// seed the search from a match of atom `i` against `delta` only, then
/// complete the remaining atoms against the full fact base. Produces the
/// same trigger set as [`restricted_triggers`] but narrows the search
/// space up front instead of post-filtering a full naive join.
fn semi_naive_triggers(
    rule: &Rule,
    rule_index: usize,
    facts: &FactBase,
    delta_facts: &FactBase,
    interner: &Interner,
) -> Result<Vec<Trigger>, EngineError> {
    let (positive, negative) = split_body_atoms(&rule.body);
    let mut seen: HashSet<Vec<(Variable, Term)>> = HashSet::new();
    let mut out = Vec::new();

    for i in 0..positive.len() {
        let seeds = find_homomorphisms(
            std::slice::from_ref(&positive[i]),
            delta_facts,
            interner,
            &StaticScheduler,
            &Substitution::new(),
        )?;
        let rest: Vec<Atom> = positive
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, a)| a.clone())
            .collect();
        for seed in seeds {
            let substs = find_homomorphisms(&rest, facts, interner, &StaticScheduler, &seed)?;
            for s in substs {
                if !negation_satisfied(&negative, &s, facts) {
                    continue;
                }
                if seen.insert(binding_key(&s)) {
                    out.push(Trigger { rule_index, substitution: s });
                }
            }
        }
    }
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
pub fn compute_triggers(
    computer: TriggerComputer,
    rule: &Rule,
    rule_index: usize,
    facts: &FactBase,
    delta: &HashSet<GroundAtom>,
    delta_facts: &FactBase,
    interner: &Interner,
) -> Result<Vec<Trigger>, EngineError> {
    match computer {
        TriggerComputer::Naive => naive_triggers(rule, rule_index, facts, interner),
        TriggerComputer::Restricted | TriggerComputer::TwoSteps => {
            restricted_triggers(rule, rule_index, facts, delta, interner)
        }
        TriggerComputer::SemiNaive => semi_naive_triggers(rule, rule_index, facts, delta_facts, interner),
    }
}
