//! Atoms: a predicate applied to terms (spec 3). Immutable once built.

use crate::term::{Interner, Predicate, Term, Variable};

/// `{predicate, args}` with `|args| == predicate.arity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub predicate: Predicate,
    pub args: Vec<Term>,
}

impl Atom {
    /// Build an atom, checking the arity invariant against the interner
    /// that owns `predicate`.
    pub fn new(interner: &Interner, predicate: Predicate, args: Vec<Term>) -> Result<Self, String> {
        let expected = interner.predicate_arity(predicate);
        if args.len() != expected {
            return Err(format!(
                "predicate '{}' has arity {expected}, but {} arguments were given",
                interner.predicate_name(predicate),
                args.len()
            ));
        }
        Ok(Atom { predicate, args })
    }

    /// Build without an arity check — used internally once a caller has
    /// already validated the shape (e.g. the homomorphism search
    /// constructing probe atoms from interned predicates it just looked
    /// up).
    pub fn new_unchecked(predicate: Predicate, args: Vec<Term>) -> Self {
        Atom { predicate, args }
    }

    pub fn free_variables(&self) -> Vec<Variable> {
        let mut out = Vec::new();
        for arg in &self.args {
            for v in arg.free_variables() {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
        }
        out
    }

    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_ground)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Interner;

    #[test]
    fn arity_mismatch_is_rejected() {
        let mut it = Interner::new();
        let p = it.intern_predicate("edge", 2);
        let x = Term::Variable(it.intern_variable("X"));
        assert!(Atom::new(&it, p, vec![x]).is_err());
    }

    #[test]
    fn free_variables_dedup_repeated_args() {
        let mut it = Interner::new();
        let p = it.intern_predicate("edge", 2);
        let x = Term::Variable(it.intern_variable("X"));
        let atom = Atom::new(&it, p, vec![x.clone(), x]).unwrap();
        assert_eq!(atom.free_variables().len(), 1);
    }
}
