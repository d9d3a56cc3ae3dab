//! Existential and universal quantifier evaluators (spec 4.4).
//!
//! `∃vars.φ` evaluates `φ` then projects `vars` out of each resulting
//! substitution, deduplicating. `∀vars.φ` is evaluated through the
//! classical duality `∀vars.φ ≡ ¬∃vars.¬φ`, reusing the negation
//! evaluator's "no extension exists" check — it raises
//! `UnsafeUniversalWarning` (spec 7) under the same unbound-variable
//! condition negation does, since both ultimately require ranging over a
//! domain the query can actually enumerate.

use super::registry::SourceRegistry;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::EngineError;
use crate::formula::Formula;
use crate::homomorphism::AtomScheduler;
use crate::substitution::Substitution;
use crate::term::{Interner, Variable};

pub fn evaluate_existential(
    vars: &[Variable],
    inner: &Formula,
    registry: &SourceRegistry,
    interner: &Interner,
    scheduler: &dyn AtomScheduler,
    diagnostics: &Diagnostics,
    seed: &Substitution,
) -> Result<Vec<Substitution>, EngineError> {
    let extensions = super::evaluate(inner, registry, interner, scheduler, diagnostics, seed)?;
    let mut projected = Vec::new();
    for s in extensions {
        let remaining: Vec<Variable> = s.domain().filter(|v| !vars.contains(v)).collect();
        let restricted = s.restrict_to(&remaining);
        if !projected.contains(&restricted) {
            projected.push(restricted);
        }
    }
    Ok(projected)
}

pub fn evaluate_universal(
    vars: &[Variable],
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
        .any(|v| !vars.contains(&v) && !seed.contains(v));
    if unbound {
        diagnostics.emit(Diagnostic::UnsafeUniversal {
            formula_summary: format!("{inner:?}"),
        });
    }

    let exists_not = Formula::Existential(vars.to_vec(), Box::new(Formula::Negation(Box::new(inner.clone()))));
    let extensions = super::evaluate(&exists_not, registry, interner, scheduler, diagnostics, seed)?;
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
    fn existential_projects_bound_variable_out() {
        let mut it = Interner::new();
        let p = it.intern_predicate("p", 1);
        let a = Term::Constant(it.intern_constant("a"));
        let mut fb = FactBase::new("facts");
        fb.add(p, vec![a]);
        let x = it.intern_variable("X");
        let inner = Formula::Atom(Atom::new_unchecked(p, vec![Term::Variable(x)]));
        let mut registry = SourceRegistry::new();
        registry.register(p, &fb);
        let diagnostics = Diagnostics::new();

        let results = evaluate_existential(
            &[x],
            &inner,
            &registry,
            &mut it,
            &StaticScheduler,
            &diagnostics,
            &Substitution::new(),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_empty());
    }

    #[test]
    fn universal_holds_when_every_domain_element_satisfies_inner() {
        let mut it = Interner::new();
        let p = it.intern_predicate("p", 1);
        let q = it.intern_predicate("q", 1);
        let a = Term::Constant(it.intern_constant("a"));
        let mut fb_p = FactBase::new("p");
        fb_p.add(p, vec![a.clone()]);
        let mut fb_q = FactBase::new("q");
        fb_q.add(q, vec![a]);

        let x = it.intern_variable("X");
        // forall X. p(X) -> treated here as forall X in domain-of-p: q(X)
        // i.e. every p also satisfies q, tested via ¬∃X.(p(X) ∧ ¬q(X)).
        let p_atom = Formula::Atom(Atom::new_unchecked(p, vec![Term::Variable(x)]));
        let q_atom = Formula::Atom(Atom::new_unchecked(q, vec![Term::Variable(x)]));
        let body = Formula::conjunction(vec![p_atom, Formula::Negation(Box::new(q_atom))]);

        let mut registry = SourceRegistry::new();
        registry.register(p, &fb_p);
        registry.register(q, &fb_q);
        let diagnostics = Diagnostics::new();

        let results = evaluate_universal(
            &[x],
            &body,
            &registry,
            &mut it,
            &StaticScheduler,
            &diagnostics,
            &Substitution::new(),
        )
        .unwrap();
        assert_eq!(results.len(), 1);
    }
}
