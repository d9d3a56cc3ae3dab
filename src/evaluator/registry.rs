//! A lookup table from predicate to the backend that answers it (spec 3,
//! "a conjunctive query may span several `ReadableData` sources").

use crate::data_source::ReadableData;
use crate::term::Predicate;
use std::collections::HashMap;

/// Maps each predicate touched by a query to the source that evaluates
/// it. Borrowing (`&'a dyn ReadableData`) rather than owning keeps this
/// cheap to build per query without cloning fact bases.
#[derive(Default)]
pub struct SourceRegistry<'a> {
    sources: HashMap<Predicate, &'a dyn ReadableData>,
}

impl<'a> SourceRegistry<'a> {
    pub fn new() -> Self {
        SourceRegistry::default()
    }

    pub fn register(&mut self, predicate: Predicate, source: &'a dyn ReadableData) -> &mut Self {
        self.sources.insert(predicate, source);
        self
    }

    pub fn resolve(&self, predicate: Predicate) -> Option<&'a dyn ReadableData> {
        self.sources.get(&predicate).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact_base::FactBase;
    use crate::term::Interner;

    #[test]
    fn resolves_only_registered_predicates() {
        let mut it = Interner::new();
        let p = it.intern_predicate("edge", 2);
        let q = it.intern_predicate("node", 1);
        let fb = FactBase::new("facts");
        let mut registry = SourceRegistry::new();
        registry.register(p, &fb);
        assert!(registry.resolve(p).is_some());
        assert!(registry.resolve(q).is_none());
    }
}
