//! The disjunctive evaluator: union of each disjunct's results,
//! deduplicated structurally (spec 4.4).

use super::registry::SourceRegistry;
use crate::diagnostics::Diagnostics;
use crate::error::EngineError;
use crate::formula::Formula;
use crate::homomorphism::AtomScheduler;
use crate::substitution::Substitution;
use crate::term::Interner;

pub fn evaluate_disjunction(
    parts: &[Formula],
    registry: &SourceRegistry,
    interner: &Interner,
    scheduler: &dyn AtomScheduler,
    diagnostics: &Diagnostics,
    seed: &Substitution,
) -> Result<Vec<Substitution>, EngineError> {
    let mut seen = Vec::new();
    for part in parts {
        for s in super::evaluate(part, registry, interner, scheduler, diagnostics, seed)? {
            if !seen.contains(&s) {
                seen.push(s);
            }
        }
    }
    Ok(seen)
}
