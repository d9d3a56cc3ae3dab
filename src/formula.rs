//! Formulas: the sum type over atoms and connectives (spec 3).
//!
//! `Equality`/`Comparison` are not separate tree nodes — per spec 3 they
//! are represented as atoms over reserved predicates (`=`, `__lt__`, ...),
//! built by [`Formula::equality`] / [`Formula::comparison`]. Free
//! variables are computed on demand rather than cached on the node: the
//! formulas this engine handles are small (prototyping scale per spec 2),
//! and caching would need interior mutability or a builder pass, which is
//! more machinery than a few hundred nodes justify (an Open Question
//! resolution, recorded in DESIGN.md).

use crate::atom::Atom;
use crate::term::{ComparisonOp, Interner, Term, Variable};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    Atom(Atom),
    /// Non-empty; written order is preserved as a scheduling hint
    /// (spec 3).
    Conjunction(Vec<Formula>),
    Disjunction(Vec<Formula>),
    Negation(Box<Formula>),
    Existential(Vec<Variable>, Box<Formula>),
    Universal(Vec<Variable>, Box<Formula>),
}

impl Formula {
    pub fn equality(interner: &Interner, l: Term, r: Term) -> Formula {
        let pred = interner.reserved_equality_predicate();
        Formula::Atom(Atom::new_unchecked(pred, vec![l, r]))
    }

    pub fn comparison(interner: &Interner, op: ComparisonOp, l: Term, r: Term) -> Formula {
        let pred = interner.reserved_comparison_predicate(op);
        Formula::Atom(Atom::new_unchecked(pred, vec![l, r]))
    }

    pub fn conjunction(parts: Vec<Formula>) -> Formula {
        assert!(!parts.is_empty(), "Conjunction must be non-empty");
        if parts.len() == 1 {
            return parts.into_iter().next().unwrap();
        }
        Formula::Conjunction(parts)
    }

    pub fn disjunction(parts: Vec<Formula>) -> Formula {
        assert!(!parts.is_empty(), "Disjunction must be non-empty");
        if parts.len() == 1 {
            return parts.into_iter().next().unwrap();
        }
        Formula::Disjunction(parts)
    }

    /// Free variables, each appearing once, in a deterministic
    /// depth-first order.
    pub fn free_variables(&self) -> Vec<Variable> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_free_variables(&mut seen, &mut out);
        out
    }

    fn collect_free_variables(&self, seen: &mut HashSet<Variable>, out: &mut Vec<Variable>) {
        match self {
            Formula::Atom(a) => {
                for v in a.free_variables() {
                    if seen.insert(v) {
                        out.push(v);
                    }
                }
            }
            Formula::Conjunction(parts) | Formula::Disjunction(parts) => {
                for p in parts {
                    p.collect_free_variables(seen, out);
                }
            }
            Formula::Negation(inner) => inner.collect_free_variables(seen, out),
            Formula::Existential(vars, inner) | Formula::Universal(vars, inner) => {
                let mut inner_seen = HashSet::new();
                let mut inner_out = Vec::new();
                inner.collect_free_variables(&mut inner_seen, &mut inner_out);
                for v in inner_out {
                    if !vars.contains(&v) && seen.insert(v) {
                        out.push(v);
                    }
                }
            }
        }
    }

    /// Flatten a top-level conjunction into its conjuncts; a non-conjunction
    /// formula is treated as a one-element conjunction. Used by the
    /// homomorphism search and the piece-unifier enumeration, both of
    /// which operate on "a conjunction of atoms" per spec 4.3/4.6.
    pub fn as_conjuncts(&self) -> Vec<&Formula> {
        match self {
            Formula::Conjunction(parts) => parts.iter().collect(),
            other => vec![other],
        }
    }

    /// All atoms reachable through Conjunction/Disjunction/Negation/
    /// quantifier wrappers — used by dependency analysis (GRD, spec 4.8)
    /// which only cares about predicates touched, not logical structure.
    pub fn atoms(&self) -> Vec<&Atom> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms<'a>(&'a self, out: &mut Vec<&'a Atom>) {
        match self {
            Formula::Atom(a) => out.push(a),
            Formula::Conjunction(parts) | Formula::Disjunction(parts) => {
                for p in parts {
                    p.collect_atoms(out);
                }
            }
            Formula::Negation(inner) => inner.collect_atoms(out),
            Formula::Existential(_, inner) | Formula::Universal(_, inner) => {
                inner.collect_atoms(out)
            }
        }
    }
}
