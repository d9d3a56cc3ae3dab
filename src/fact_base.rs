//! Fact bases: a set of ground atoms with predicate/position indexes
//! (spec 3, 4.2).

use crate::data_source::{AtomicPattern, BasicQuery, MaterializedData, ReadableData, Writable};
use crate::error::EngineError;
use crate::term::{Predicate, Term};
use std::collections::{HashMap, HashSet};

/// A ground atom, stored as a flat tuple keyed by predicate (spec 9,
/// "Cyclic data": flat tuples of term ids, never pointer graphs).
pub type GroundAtom = (Predicate, Vec<Term>);

/// An in-memory fact base (spec 4.2).
///
/// Not thread-safe (spec 5): external synchronization is required if a
/// `FactBase` is shared across threads (the multi-threaded chase applier,
/// spec 4.10 step 5, wraps it in a `parking_lot::Mutex` instead of making
/// the type itself concurrent).
#[derive(Debug, Clone, Default)]
pub struct FactBase {
    name: String,
    by_predicate: HashMap<Predicate, HashSet<Vec<Term>>>,
    by_position: HashMap<(Predicate, usize, Term), HashSet<Vec<Term>>>,
    frozen: bool,
}

impl FactBase {
    pub fn new(name: impl Into<String>) -> Self {
        FactBase {
            name: name.into(),
            by_predicate: HashMap::new(),
            by_position: HashMap::new(),
            frozen: false,
        }
    }

    /// Build from a seed set of ground atoms (spec 4.2, "Lifecycle").
    pub fn from_atoms(name: impl Into<String>, atoms: impl IntoIterator<Item = GroundAtom>) -> Self {
        let mut fb = FactBase::new(name);
        for (pred, args) in atoms {
            fb.add(pred, args);
        }
        fb
    }

    /// Forbid further mutation (spec 4.2, "frozen variant").
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.by_predicate.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.by_predicate.keys()
    }

    pub fn atoms_for(&self, predicate: Predicate) -> impl Iterator<Item = &Vec<Term>> {
        self.by_predicate.get(&predicate).into_iter().flatten()
    }

    pub fn contains(&self, predicate: Predicate, args: &[Term]) -> bool {
        self.by_predicate
            .get(&predicate)
            .is_some_or(|set| set.contains(args))
    }

    pub fn all_atoms(&self) -> impl Iterator<Item = (Predicate, &Vec<Term>)> {
        self.by_predicate
            .iter()
            .flat_map(|(pred, set)| set.iter().map(move |args| (*pred, args)))
    }

    /// `add(atom)`: idempotent, returns whether new (spec 4.2).
    pub fn add(&mut self, predicate: Predicate, args: Vec<Term>) -> bool {
        if self.frozen {
            return false;
        }
        let set = self.by_predicate.entry(predicate).or_default();
        if !set.insert(args.clone()) {
            return false;
        }
        for (pos, term) in args.iter().enumerate() {
            self.by_position
                .entry((predicate, pos, term.clone()))
                .or_default()
                .insert(args.clone());
        }
        true
    }

    /// `remove(atom)`: removes from all indices (spec 4.2).
    pub fn remove(&mut self, predicate: Predicate, args: &[Term]) -> bool {
        if self.frozen {
            return false;
        }
        let removed = self
            .by_predicate
            .get_mut(&predicate)
            .is_some_and(|set| set.remove(args));
        if removed {
            for (pos, term) in args.iter().enumerate() {
                if let Some(set) = self.by_position.get_mut(&(predicate, pos, term.clone())) {
                    set.remove(args);
                }
            }
        }
        removed
    }

    /// Evaluate a `BasicQuery` against this fact base (spec 4.2
    /// algorithm): start from the predicate's atoms, filter by each bound
    /// position using the `(predicate, position, term)` index when
    /// available, then project answer positions in key order.
    pub fn evaluate_query(&self, query: &BasicQuery) -> Vec<Vec<Term>> {
        let candidates: Vec<&Vec<Term>> = self.smallest_candidate_set(query);

        let answer_order = query.ordered_answer_positions();
        candidates
            .into_iter()
            .filter(|args| self.matches_bound_positions(args, query))
            .map(|args| {
                answer_order
                    .iter()
                    .map(|(pos, _)| args[*pos].clone())
                    .collect()
            })
            .collect()
    }

    fn matches_bound_positions(&self, args: &[Term], query: &BasicQuery) -> bool {
        query
            .bound_positions
            .iter()
            .all(|(pos, term)| args.get(*pos) == Some(term))
    }

    /// Picks the cheapest available index probe: a bound position's
    /// `(predicate, position, term)` bucket if one exists, else the full
    /// per-predicate set (spec 4.2: "using the index when available, else
    /// linear filter").
    fn smallest_candidate_set(&self, query: &BasicQuery) -> Vec<&Vec<Term>> {
        let mut best: Option<&HashSet<Vec<Term>>> = None;
        for (pos, term) in &query.bound_positions {
            if let Some(set) = self.by_position.get(&(query.predicate, *pos, term.clone())) {
                if best.is_none_or(|b| set.len() < b.len()) {
                    best = Some(set);
                }
            }
        }
        match best {
            Some(set) => set.iter().collect(),
            None => self
                .by_predicate
                .get(&query.predicate)
                .map(|set| set.iter().collect())
                .unwrap_or_default(),
        }
    }
}

impl ReadableData for FactBase {
    fn evaluate<'a>(
        &'a self,
        query: &BasicQuery,
    ) -> Result<Box<dyn Iterator<Item = Vec<Term>> + 'a>, EngineError> {
        Ok(Box::new(self.evaluate_query(query).into_iter()))
    }

    fn pattern(&self) -> AtomicPattern {
        AtomicPattern::default()
    }

    fn estimate_bound(&self, query: &BasicQuery) -> Option<usize> {
        Some(self.smallest_candidate_set(query).len())
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

impl MaterializedData for FactBase {
    fn enumerate(&self, predicate: Predicate) -> Vec<Vec<Term>> {
        self.atoms_for(predicate).cloned().collect()
    }
}

impl Writable for FactBase {
    fn add(&mut self, predicate: Predicate, args: Vec<Term>) -> bool {
        FactBase::add(self, predicate, args)
    }

    fn remove(&mut self, predicate: Predicate, args: &[Term]) -> bool {
        FactBase::remove(self, predicate, args)
    }
}
