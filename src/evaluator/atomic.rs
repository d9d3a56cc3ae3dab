//! The atomic evaluator: a single `Atom`, rewritten and resolved against
//! the registry, then handed to homomorphism search (spec 4.4).

use super::registry::SourceRegistry;
use super::rewrite::rewrite_atom;
use crate::atom::Atom;
use crate::error::EngineError;
use crate::homomorphism::{find_homomorphisms, AtomScheduler};
use crate::substitution::Substitution;
use crate::term::Interner;

pub fn evaluate_atom(
    atom: &Atom,
    registry: &SourceRegistry,
    interner: &Interner,
    scheduler: &dyn AtomScheduler,
    seed: &Substitution,
) -> Result<Vec<Substitution>, EngineError> {
    let (rewritten, constraints) = rewrite_atom(atom, interner);
    let mut all_atoms = vec![rewritten];
    all_atoms.extend(constraints);

    // Every atom in this conjunction (the rewritten original plus any
    // function-evaluation constraints) must resolve to a registered
    // source; the homomorphism search itself only probes one source at a
    // time, so group atoms by predicate and run a sub-search per group,
    // joining results — a conjunctive query spanning heterogeneous
    // backends (spec 3) otherwise has no single `ReadableData` to search.
    let mut results = vec![seed.clone()];
    for group in group_by_source(&all_atoms, registry)? {
        let (source, group_atoms) = group;
        let mut next = Vec::new();
        for s in &results {
            next.extend(find_homomorphisms(
                &group_atoms,
                source,
                interner,
                scheduler,
                s,
            )?);
        }
        results = next;
        if results.is_empty() {
            break;
        }
    }
    Ok(results)
}

fn group_by_source<'a>(
    atoms: &[Atom],
    registry: &SourceRegistry<'a>,
) -> Result<Vec<(&'a dyn crate::data_source::ReadableData, Vec<Atom>)>, EngineError> {
    let mut groups: Vec<(&'a dyn crate::data_source::ReadableData, Vec<Atom>)> = Vec::new();
    for atom in atoms {
        let source = registry.resolve(atom.predicate).ok_or_else(|| EngineError::Evaluation {
            source_name: "registry".to_string(),
            message: format!("no source registered for predicate id {:?}", atom.predicate.0),
        })?;
        match groups.iter_mut().find(|(s, _)| std::ptr::eq(*s, source)) {
            Some((_, bucket)) => bucket.push(atom.clone()),
            None => groups.push((source, vec![atom.clone()])),
        }
    }
    Ok(groups)
}
