//! The `ReadableData` protocol: the capability every backend (fact base,
//! computed-predicate library, comparison source, federated view, ...)
//! implements (spec 3, 6).

use crate::error::EngineError;
use crate::term::{Predicate, Term, Variable};
use std::collections::HashMap;

/// `{predicate, bound_positions, answer_positions}` (spec 3).
#[derive(Debug, Clone)]
pub struct BasicQuery {
    pub predicate: Predicate,
    /// Positions that must hold a ground term at evaluation time.
    pub bound_positions: HashMap<usize, Term>,
    /// Positions whose value should be projected into the answer tuple,
    /// keyed by position with the variable that names it.
    pub answer_positions: HashMap<usize, Variable>,
}

impl BasicQuery {
    pub fn new(predicate: Predicate) -> Self {
        BasicQuery {
            predicate,
            bound_positions: HashMap::new(),
            answer_positions: HashMap::new(),
        }
    }

    pub fn with_bound(mut self, position: usize, term: Term) -> Self {
        self.bound_positions.insert(position, term);
        self
    }

    pub fn with_answer(mut self, position: usize, var: Variable) -> Self {
        self.answer_positions.insert(position, var);
        self
    }

    /// Answer positions in ascending key order — the order `evaluate`
    /// must build result tuples in (spec 4.2 step 3).
    pub fn ordered_answer_positions(&self) -> Vec<(usize, Variable)> {
        let mut out: Vec<_> = self.answer_positions.iter().map(|(p, v)| (*p, *v)).collect();
        out.sort_by_key(|(p, _)| *p);
        out
    }
}

/// Per-position constraints a data source publishes about the queries it
/// can answer (spec 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionType {
    Ground,
    Constant,
    Variable,
    Literal,
    Any,
}

#[derive(Debug, Clone, Default)]
pub struct AtomicPattern {
    pub mandatory: Vec<usize>,
    pub allowed_type: HashMap<usize, PositionType>,
}

impl AtomicPattern {
    pub fn new(mandatory: Vec<usize>) -> Self {
        AtomicPattern {
            mandatory,
            allowed_type: HashMap::new(),
        }
    }

    pub fn fully_unconstrained(arity: usize) -> Self {
        let mut allowed_type = HashMap::new();
        for i in 0..arity {
            allowed_type.insert(i, PositionType::Any);
        }
        AtomicPattern {
            mandatory: Vec::new(),
            allowed_type,
        }
    }

    /// Whether `bound` covers every mandatory position.
    pub fn satisfied_by(&self, bound: &HashMap<usize, Term>) -> bool {
        self.mandatory.iter().all(|p| bound.contains_key(p))
    }
}

/// The capability every readable backend implements (spec 3).
///
/// Boxed-iterator return keeps this trait object-safe so the scheduler
/// (spec 4.3) can hold a `Vec<&dyn ReadableData>` over heterogeneous
/// backends (fact base, computed source, comparison source, ...).
pub trait ReadableData {
    fn evaluate<'a>(
        &'a self,
        query: &BasicQuery,
    ) -> Result<Box<dyn Iterator<Item = Vec<Term>> + 'a>, EngineError>;

    fn pattern(&self) -> AtomicPattern;

    /// A cheap, no-evaluation upper bound on the number of result tuples
    /// `evaluate` would yield given the currently bound positions. `None`
    /// means unknown/unbounded.
    fn estimate_bound(&self, query: &BasicQuery) -> Option<usize>;

    /// Whether this source can answer `query` at all: every mandatory
    /// position of its pattern must be bound.
    fn can_evaluate(&self, query: &BasicQuery) -> bool {
        self.pattern().satisfied_by(&query.bound_positions)
    }

    /// A human-readable identity for error messages (spec 7).
    fn source_name(&self) -> &str;
}

/// A `ReadableData` source that can enumerate its full extension per
/// predicate (not just probe a `BasicQuery`).
pub trait MaterializedData: ReadableData {
    fn enumerate(&self, predicate: Predicate) -> Vec<Vec<Term>>;
}

/// A `ReadableData` source that accepts mutation.
pub trait Writable: ReadableData {
    /// Returns whether the atom was newly added (spec 4.2).
    fn add(&mut self, predicate: Predicate, args: Vec<Term>) -> bool;
    fn remove(&mut self, predicate: Predicate, args: &[Term]) -> bool;
}

/// A source that can say which ground atoms it considers valid, without
/// necessarily exposing its full extension (e.g. a schema-constrained
/// remote store).
pub trait AtomAcceptance {
    fn accepts(&self, predicate: Predicate, args: &[Term]) -> bool;
}

/// A source capable of delegating whole rules/queries to an external
/// engine rather than evaluating atom-by-atom (spec 3, 6).
pub trait DatalogDelegable {
    fn delegate_rules(&self, rule_ids: &[usize]) -> Result<(), EngineError>;
    fn delegate_query(&self, query_id: usize) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Interner;

    #[test]
    fn pattern_satisfied_requires_every_mandatory_position_bound() {
        let mut it = Interner::new();
        let a = it.intern_constant("a");
        let pattern = AtomicPattern::new(vec![0, 1]);
        let mut bound = HashMap::new();
        assert!(!pattern.satisfied_by(&bound));
        bound.insert(0, Term::Constant(a));
        assert!(!pattern.satisfied_by(&bound));
        bound.insert(1, Term::Constant(a));
        assert!(pattern.satisfied_by(&bound));
    }

    #[test]
    fn basic_query_orders_answer_positions_ascending() {
        let mut it = Interner::new();
        let p = it.intern_predicate("edge", 2);
        let x = it.intern_variable("X");
        let y = it.intern_variable("Y");
        let q = BasicQuery::new(p).with_answer(1, y).with_answer(0, x);
        assert_eq!(q.ordered_answer_positions(), vec![(0, x), (1, y)]);
    }
}
