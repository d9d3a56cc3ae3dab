//! Lineage tracking (spec 4.10): optional provenance recording, mapping
//! each produced atom back to the rule and trigger that created it.

use crate::fact_base::GroundAtom;
use crate::substitution::Substitution;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineagePolicy {
    /// No tracking; zero overhead.
    None,
    /// One entry per produced atom, overwritten if re-derived.
    Simple,
    /// Like `Simple`, but keeps every distinct derivation instead of only
    /// the most recent (useful when several data sources contribute the
    /// same atom under federation).
    Federated,
}

#[derive(Debug, Clone)]
pub struct Provenance {
    pub rule_index: usize,
    pub bindings: Vec<(String, String)>,
}

fn bindings_of(subst: &Substitution) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> =
        subst.iter().map(|(v, t)| (format!("{:?}", v), format!("{:?}", t))).collect();
    entries.sort();
    entries
}

#[derive(Debug, Default)]
pub struct LineageTracker {
    policy: Option<LineagePolicy>,
    simple: HashMap<GroundAtom, Provenance>,
    federated: HashMap<GroundAtom, Vec<Provenance>>,
}

impl LineageTracker {
    pub fn new(policy: LineagePolicy) -> Self {
        let policy = if matches!(policy, LineagePolicy::None) { None } else { Some(policy) };
        Self { policy, simple: HashMap::new(), federated: HashMap::new() }
    }

    pub fn record(&mut self, atom: GroundAtom, rule_index: usize, subst: &Substitution) {
        let Some(policy) = self.policy else { return };
        let provenance = Provenance { rule_index, bindings: bindings_of(subst) };
        match policy {
            LineagePolicy::None => unreachable!(),
            LineagePolicy::Simple => {
                self.simple.insert(atom, provenance);
            }
            LineagePolicy::Federated => {
                self.federated.entry(atom).or_default().push(provenance);
            }
        }
    }

    pub fn lineage_of(&self, atom: &GroundAtom) -> Vec<&Provenance> {
        match self.policy {
            Some(LineagePolicy::Simple) => self.simple.get(atom).into_iter().collect(),
            Some(LineagePolicy::Federated) => self.federated.get(atom).map(|v| v.iter().collect()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
