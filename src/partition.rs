//! Term partitions: union-find over terms, used by unifiers and equality
//! handling (spec 3).
//!
//! A partition tracks equivalence classes of terms. Two distinct
//! constants landing in the same class is a conflict — piece-unifier
//! enumeration (spec 4.6) treats that as a bail-out of the current
//! candidate, not a panic (spec 9, "Exceptions").

use crate::term::Term;
use std::collections::HashMap;

/// Opaque handle to an equivalence class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(usize);

#[derive(Debug, Clone)]
struct Node {
    parent: usize,
    rank: usize,
}

/// Union-find over a fixed universe of terms, built incrementally: terms
/// are registered on first use via [`TermPartition::find_or_insert`].
#[derive(Debug, Clone, Default)]
pub struct TermPartition {
    nodes: Vec<Node>,
    members: Vec<Vec<Term>>,
    index: HashMap<Term, usize>,
}

impl TermPartition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `term` as a singleton class if not already present; return
    /// its class id.
    pub fn find_or_insert(&mut self, term: &Term) -> ClassId {
        if let Some(&idx) = self.index.get(term) {
            return ClassId(self.find_root(idx));
        }
        let idx = self.nodes.len();
        self.nodes.push(Node { parent: idx, rank: 0 });
        self.members.push(vec![term.clone()]);
        self.index.insert(term.clone(), idx);
        ClassId(idx)
    }

    pub fn find(&self, term: &Term) -> Option<ClassId> {
        let idx = *self.index.get(term)?;
        Some(ClassId(self.find_root_immutable(idx)))
    }

    fn find_root(&mut self, idx: usize) -> usize {
        if self.nodes[idx].parent != idx {
            let root = self.find_root(self.nodes[idx].parent);
            self.nodes[idx].parent = root;
        }
        self.nodes[idx].parent
    }

    fn find_root_immutable(&self, mut idx: usize) -> usize {
        while self.nodes[idx].parent != idx {
            idx = self.nodes[idx].parent;
        }
        idx
    }

    /// Members of the class containing `term`, or an empty slice if the
    /// term was never inserted.
    pub fn class_members(&self, class: ClassId) -> &[Term] {
        &self.members[class.0]
    }

    /// Union the classes of `a` and `b`. Fails (returning `false`) iff the
    /// resulting class would contain two distinct constants — the
    /// conflict spec 4.6 names explicitly.
    pub fn union(&mut self, a: &Term, b: &Term) -> bool {
        let ra = self.find_or_insert(a);
        let rb = self.find_or_insert(b);
        if ra == rb {
            return true;
        }
        if !self.classes_compatible(ra, rb) {
            return false;
        }
        self.union_roots(ra.0, rb.0);
        true
    }

    fn classes_compatible(&self, a: ClassId, b: ClassId) -> bool {
        let constants_a: Vec<&Term> = self.members[a.0]
            .iter()
            .filter(|t| matches!(t, Term::Constant(_) | Term::Literal(_)))
            .collect();
        let constants_b: Vec<&Term> = self.members[b.0]
            .iter()
            .filter(|t| matches!(t, Term::Constant(_) | Term::Literal(_)))
            .collect();
        if constants_a.is_empty() || constants_b.is_empty() {
            return true;
        }
        // At most one constant per merged class: every constant already
        // present on one side must equal every constant on the other.
        constants_a
            .iter()
            .all(|ca| constants_b.iter().all(|cb| ca == cb))
    }

    fn union_roots(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find_root(a), self.find_root(b));
        if a == b {
            return;
        }
        let (new_root, absorbed) = if self.nodes[a].rank < self.nodes[b].rank {
            (b, a)
        } else {
            (a, b)
        };
        self.nodes[absorbed].parent = new_root;
        if self.nodes[a].rank == self.nodes[b].rank {
            self.nodes[new_root].rank += 1;
        }
        let moved = std::mem::take(&mut self.members[absorbed]);
        self.members[new_root].extend(moved);
    }

    /// Merge another partition into this one, failing on a constant
    /// conflict. Used when combining independent disjunct partitions for
    /// a disjunctive piece unifier (spec 4.6).
    pub fn merge(&mut self, other: &TermPartition) -> bool {
        for members in &other.members {
            if members.len() < 2 {
                continue;
            }
            let first = &members[0];
            for t in &members[1..] {
                if !self.union(first, t) {
                    return false;
                }
            }
        }
        true
    }

    /// Whether every equivalence class with more than one constant has
    /// been rejected already — i.e. the partition is internally
    /// consistent. Exposed for callers that build partitions by hand
    /// (e.g. the disjunctive unifier) rather than exclusively through
    /// `union`.
    pub fn is_consistent(&self) -> bool {
        self.members.iter().enumerate().all(|(idx, _)| {
            let root = self.find_root_immutable(idx);
            if root != idx {
                return true;
            }
            self.classes_compatible(ClassId(idx), ClassId(idx))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Interner;

    #[test]
    fn union_merges_two_classes() {
        let mut it = Interner::new();
        let mut p = TermPartition::new();
        let x = Term::Variable(it.intern_variable("X"));
        let y = Term::Variable(it.intern_variable("Y"));
        assert!(p.union(&x, &y));
        assert_eq!(p.find(&x), p.find(&y));
    }

    #[test]
    fn two_distinct_constants_in_one_class_is_rejected() {
        let mut it = Interner::new();
        let mut p = TermPartition::new();
        let a = Term::Constant(it.intern_constant("a"));
        let b = Term::Constant(it.intern_constant("b"));
        assert!(!p.union(&a, &b));
    }

    #[test]
    fn a_constant_unified_with_itself_through_a_variable_is_fine() {
        let mut it = Interner::new();
        let mut p = TermPartition::new();
        let a = Term::Constant(it.intern_constant("a"));
        let x = Term::Variable(it.intern_variable("X"));
        let y = Term::Variable(it.intern_variable("Y"));
        assert!(p.union(&a, &x));
        assert!(p.union(&x, &y));
        assert!(p.union(&y, &a));
        assert_eq!(p.find(&a), p.find(&x));
        assert_eq!(p.find(&a), p.find(&y));
    }

    #[test]
    fn merge_propagates_conflicts() {
        let mut it = Interner::new();
        let mut p1 = TermPartition::new();
        let mut p2 = TermPartition::new();
        let a = Term::Constant(it.intern_constant("a"));
        let b = Term::Constant(it.intern_constant("b"));
        let x = Term::Variable(it.intern_variable("X"));
        p1.union(&x, &a);
        p2.union(&x, &b);
        assert!(!p1.merge(&p2));
    }
}
