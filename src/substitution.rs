//! Substitutions: finite maps `Variable -> Term` (spec 3, 4.1).

use crate::term::{Term, Variable};
use std::collections::HashMap;

/// A finite map from variables to terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    bindings: HashMap<Variable, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(v: Variable, t: Term) -> Self {
        let mut s = Self::new();
        s.bind(v, t);
        s
    }

    pub fn bind(&mut self, v: Variable, t: Term) {
        self.bindings.insert(v, t);
    }

    pub fn get(&self, v: Variable) -> Option<&Term> {
        self.bindings.get(&v)
    }

    pub fn contains(&self, v: Variable) -> bool {
        self.bindings.contains_key(&v)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn domain(&self) -> impl Iterator<Item = Variable> + '_ {
        self.bindings.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &Term)> {
        self.bindings.iter().map(|(v, t)| (*v, t))
    }

    /// Apply this substitution to a term, recursively through function
    /// term arguments.
    pub fn apply_term(&self, term: &Term) -> Term {
        match term {
            Term::Variable(v) => self.bindings.get(v).cloned().unwrap_or_else(|| term.clone()),
            Term::Constant(_) | Term::Literal(_) => term.clone(),
            Term::LogicalFunctionTerm(f, args) => {
                Term::LogicalFunctionTerm(*f, args.iter().map(|a| self.apply_term(a)).collect())
            }
            Term::EvaluableFunctionTerm(f, args) => {
                Term::EvaluableFunctionTerm(*f, args.iter().map(|a| self.apply_term(a)).collect())
            }
        }
    }

    /// `(self ∘ right).apply(x) == self.apply(right.apply(x))` — `right`
    /// acts first (spec 3, spec 8 invariant 2).
    pub fn compose(&self, right: &Substitution) -> Substitution {
        let mut out = Substitution::new();
        for (v, t) in right.iter() {
            out.bind(v, self.apply_term(t));
        }
        for (v, t) in self.iter() {
            out.bindings.entry(v).or_insert_with(|| t.clone());
        }
        out
    }

    /// Iterate applying the substitution to its own range until a fixed
    /// point is reached, closing over variable-to-variable chains
    /// (spec 4.1; spec 8 invariant 1: `normalize` is idempotent).
    pub fn normalize(&self) -> Substitution {
        let mut current = self.clone();
        loop {
            let mut changed = false;
            let mut next = Substitution::new();
            for (v, t) in current.iter() {
                let new_t = current.apply_term(t);
                if &new_t != t {
                    changed = true;
                }
                next.bind(v, new_t);
            }
            if !changed {
                return next;
            }
            current = next;
        }
    }

    /// Restrict the domain to the given set of variables.
    pub fn restrict_to(&self, vars: &[Variable]) -> Substitution {
        let mut out = Substitution::new();
        for v in vars {
            if let Some(t) = self.get(*v) {
                out.bind(*v, t.clone());
            }
        }
        out
    }

    /// Extend with a single binding, rejecting an inconsistent rebind of
    /// an existing variable to a structurally different term. Used by the
    /// homomorphism search to extend a partial substitution (spec 4.3).
    pub fn extend_consistent(&self, v: Variable, t: Term) -> Option<Substitution> {
        if let Some(existing) = self.get(v) {
            if existing != &t {
                return None;
            }
            return Some(self.clone());
        }
        let mut out = self.clone();
        out.bind(v, t);
        Some(out)
    }
}
