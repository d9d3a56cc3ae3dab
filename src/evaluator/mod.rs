//! The first-order query evaluator stack (spec 4.4): atomic, conjunctive,
//! disjunctive, negation, and quantifier evaluators composed by
//! recursing over a [`Formula`]'s structure, plus `PreparedQuery` — the
//! query-preparation step that rewrites evaluable function terms out of
//! atoms (spec 4.4 step 2) before any search begins.

mod atomic;
mod conjunction;
mod disjunction;
mod negation;
mod quantifier;
mod registry;
mod rewrite;

pub use registry::SourceRegistry;
pub use rewrite::{rewrite_atom, rewrite_formula};

use crate::diagnostics::Diagnostics;
use crate::error::EngineError;
use crate::formula::Formula;
use crate::homomorphism::AtomScheduler;
use crate::query::FOQuery;
use crate::substitution::Substitution;
use crate::term::{Interner, Term, Variable};

/// Evaluate any formula against `registry` under the current bindings in
/// `seed`, dispatching on the formula's connective (spec 4.4).
pub fn evaluate(
    formula: &Formula,
    registry: &SourceRegistry,
    interner: &Interner,
    scheduler: &dyn AtomScheduler,
    diagnostics: &Diagnostics,
    seed: &Substitution,
) -> Result<Vec<Substitution>, EngineError> {
    match formula {
        Formula::Atom(a) => atomic::evaluate_atom(a, registry, interner, scheduler, seed),
        Formula::Conjunction(parts) => {
            conjunction::evaluate_conjunction(parts, registry, interner, scheduler, diagnostics, seed)
        }
        Formula::Disjunction(parts) => {
            disjunction::evaluate_disjunction(parts, registry, interner, scheduler, diagnostics, seed)
        }
        Formula::Negation(inner) => {
            negation::evaluate_negation(inner, registry, interner, scheduler, diagnostics, seed)
        }
        Formula::Existential(vars, inner) => {
            quantifier::evaluate_existential(vars, inner, registry, interner, scheduler, diagnostics, seed)
        }
        Formula::Universal(vars, inner) => {
            quantifier::evaluate_universal(vars, inner, registry, interner, scheduler, diagnostics, seed)
        }
    }
}

/// A query, rewritten once at preparation time so the evaluator never has
/// to deal with evaluable function terms mid-search (spec 4.4 step 2).
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub answer_vars: Vec<Variable>,
    pub body: Formula,
}

impl PreparedQuery {
    pub fn prepare(query: &FOQuery, interner: &Interner) -> PreparedQuery {
        PreparedQuery {
            answer_vars: query.answer_vars.clone(),
            body: rewrite_formula(&query.body, interner),
        }
    }

    /// Run the query, projecting each resulting substitution onto
    /// `answer_vars` in the query's declared order (spec 3).
    pub fn run(
        &self,
        registry: &SourceRegistry,
        interner: &Interner,
        scheduler: &dyn AtomScheduler,
        diagnostics: &Diagnostics,
    ) -> Result<Vec<Vec<Term>>, EngineError> {
        let substitutions = evaluate(
            &self.body,
            registry,
            interner,
            scheduler,
            diagnostics,
            &Substitution::new(),
        )?;
        Ok(substitutions
            .into_iter()
            .map(|s| {
                self.answer_vars
                    .iter()
                    .map(|v| s.get(*v).cloned().unwrap_or(Term::Variable(*v)))
                    .collect()
            })
            .collect())
    }
}
