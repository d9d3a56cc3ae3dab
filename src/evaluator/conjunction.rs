//! The conjunctive evaluator: sequential refinement across conjuncts
//! (spec 4.4), each one narrowing the set of candidate substitutions
//! produced by the previous.

use super::registry::SourceRegistry;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;
use crate::formula::Formula;
use crate::homomorphism::AtomScheduler;
use crate::substitution::Substitution;
use crate::term::Interner;

pub fn evaluate_conjunction(
    parts: &[Formula],
    registry: &SourceRegistry,
    interner: &Interner,
    scheduler: &dyn AtomScheduler,
    diagnostics: &Diagnostics,
    seed: &Substitution,
) -> Result<Vec<Substitution>, EngineError> {
    let mut results = vec![seed.clone()];
    for part in parts {
        if results.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for s in &results {
            next.extend(super::evaluate(part, registry, interner, scheduler, diagnostics, s)?);
        }
        results = next;
    }
    Ok(results)
}
