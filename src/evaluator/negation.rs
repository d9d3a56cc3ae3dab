//! The negation evaluator (spec 4.4, 7): `¬φ` holds under `seed` iff `φ`
//! has no extension of `seed`. Free variables of `φ` not already bound by
//! `seed` raise `UnsafeNegationWarning` (spec 7) — evaluation proceeds
//! anyway (it just treats those variables as ranging over the query's
//! current domain), matching the "not fatal, but observable" contract of
//! the diagnostics sink.

use super::registry::SourceRegistry;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::EngineError;
use crate::formula::Formula;
use crate::homomorphism::AtomScheduler;
use crate::substitution::Substitution;
use crate::term::Interner;

pub fn evaluate_negation(
    inner: &Formula,
    registry: &SourceRegistry,
    interner: &Interner,
    scheduler: &dyn AtomScheduler,
    diagnostics: &Diagnostics,
    seed: &Substitution,
) -> Result<Vec<Substitution>, EngineError> {
    let unbound = inner
        .free_variables()
        .into_iter()
        .any(|v| !seed.contains(v));
    if unbound {
        diagnostics.emit(Diagnostic::UnsafeNegation {
            formula_summary: format!("{inner:?}"),
        });
    }

    let extensions = super::evaluate(inner, registry, interner, scheduler, diagnostics, seed)?;
    if extensions.is_empty() {
        Ok(vec![seed.clone()])
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::fact_base::FactBase;
    use crate::homomorphism::StaticScheduler;
    use crate::term::Term;

    #[test]
    fn negation_survives_when_inner_has_no_extension() {
        let mut it = Interner::new();
        let p = it.intern_predicate("p", 1);
        let fb = FactBase::new("facts");
        let x = it.intern_variable("X");
        let inner = Formula::Atom(Atom::new_unchecked(p, vec![Term::Variable(x)]));
        let mut registry = SourceRegistry::new();
        registry.register(p, &fb);
        let diagnostics = Diagnostics::new();

        let a = Term::Constant(it.intern_constant("a"));
        let seed = Substitution::singleton(x, a);
        let results =
            evaluate_negation(&inner, &registry, &mut it, &StaticScheduler, &diagnostics, &seed).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn negation_fails_when_inner_has_an_extension() {
        let mut it = Interner::new();
        let p = it.intern_predicate("p", 1);
        let a = Term::Constant(it.intern_constant("a"));
        let mut fb = FactBase::new("facts");
        fb.add(p, vec![a.clone()]);
        let x = it.intern_variable("X");
        let inner = Formula::Atom(Atom::new_unchecked(p, vec![Term::Variable(x)]));
        let mut registry = SourceRegistry::new();
        registry.register(p, &fb);
        let diagnostics = Diagnostics::new();

        let seed = Substitution::singleton(x, a);
        let results =
            evaluate_negation(&inner, &registry, &mut it, &StaticScheduler, &diagnostics, &seed).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn unbound_negation_variable_raises_a_diagnostic() {
        let mut it = Interner::new();
        let p = it.intern_predicate("p", 1);
        let fb = FactBase::new("facts");
        let x = it.intern_variable("X");
        let inner = Formula::Atom(Atom::new_unchecked(p, vec![Term::Variable(x)]));
        let mut registry = SourceRegistry::new();
        registry.register(p, &fb);
        let diagnostics = Diagnostics::new();

        evaluate_negation(&inner, &registry, &mut it, &StaticScheduler, &diagnostics, &Substitution::new())
            .unwrap();
        assert_eq!(diagnostics.snapshot().len(), 1);
    }
}
