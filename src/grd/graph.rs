//! GRD construction (spec 4.8): rules as nodes, an edge `r -> s` iff `r`'s
//! head can trigger `s`'s body. Three edge modes trade precision for cost;
//! negative edges mark a consumer's negated-atom dependency on a producer.

use serde::{Deserialize, Serialize};
use crate::atom::Atom;
use crate::formula::Formula;
use crate::rule::Rule;
use crate::term::Predicate;
use crate::unifier::enumerate_piece_unifiers;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrdMode {
    Predicate,
    Unifier,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrdEdge {
    pub negative: bool,
}

/// Graph of Rule Dependencies: one node per rule (indexed positionally
/// into the slice the caller built it from), edges per [`GrdEdge`].
#[derive(Debug, Clone)]
pub struct Grd {
    pub graph: DiGraph<usize, GrdEdge>,
    pub nodes: Vec<NodeIndex>,
}

impl Grd {
    pub fn node_of(&self, rule_index: usize) -> NodeIndex {
        self.nodes[rule_index]
    }

    pub fn rule_index_of(&self, node: NodeIndex) -> usize {
        self.graph[node]
    }

    pub fn has_negative_edge(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph
            .edges_connecting(a, b)
            .any(|e| e.weight().negative)
    }
}

fn body_atoms_with_negation<'a>(f: &'a Formula, negated: bool, out: &mut Vec<(&'a Atom, bool)>) {
    match f {
        Formula::Atom(a) => out.push((a, negated)),
        Formula::Conjunction(parts) | Formula::Disjunction(parts) => {
            for p in parts {
                body_atoms_with_negation(p, negated, out);
            }
        }
        Formula::Negation(inner) => body_atoms_with_negation(inner, true, out),
        Formula::Existential(_, inner) | Formula::Universal(_, inner) => {
            body_atoms_with_negation(inner, negated, out)
        }
    }
}

fn rule_body_atoms(rule: &Rule) -> Vec<(&Atom, bool)> {
    let mut out = Vec::new();
    body_atoms_with_negation(&rule.body, false, &mut out);
    out
}

fn rule_head_predicates(rule: &Rule) -> HashSet<Predicate> {
    rule.head_disjuncts()
        .iter()
        .flat_map(|d| d.atoms())
        .map(|a| a.predicate)
        .collect()
}

fn predicate_edge(producer: &Rule, consumer: &Rule) -> (bool, bool) {
    let produces = rule_head_predicates(producer);
    let mut positive = false;
    let mut negative = false;
    for (atom, is_negated) in rule_body_atoms(consumer) {
        if produces.contains(&atom.predicate) {
            if is_negated {
                negative = true;
            } else {
                positive = true;
            }
        }
    }
    (positive, negative)
}

fn unifier_edge_exists(producer: &Rule, body_atom: &Atom) -> bool {
    let query_atoms = vec![body_atom.clone()];
    producer.head_disjuncts().iter().any(|d| {
        let head_atoms = d.atoms();
        !enumerate_piece_unifiers(&query_atoms, producer, &head_atoms).is_empty()
    })
}

fn unifier_edge(producer: &Rule, consumer: &Rule) -> (bool, bool) {
    let mut positive = false;
    let mut negative = false;
    for (atom, is_negated) in rule_body_atoms(consumer) {
        if unifier_edge_exists(producer, atom) {
            if is_negated {
                negative = true;
            } else {
                positive = true;
            }
        }
    }
    (positive, negative)
}

fn empty_grd(len: usize) -> Grd {
    let mut graph = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..len).map(|i| graph.add_node(i)).collect();
    Grd { graph, nodes }
}

fn fill_edges(g: &mut Grd, rules: &[Rule], edge_fn: impl Fn(&Rule, &Rule) -> (bool, bool)) {
    for (p_i, producer) in rules.iter().enumerate() {
        for (c_i, consumer) in rules.iter().enumerate() {
            let (positive, negative) = edge_fn(producer, consumer);
            if positive {
                g.graph.add_edge(g.nodes[p_i], g.nodes[c_i], GrdEdge { negative: false });
            }
            if negative {
                g.graph.add_edge(g.nodes[p_i], g.nodes[c_i], GrdEdge { negative: true });
            }
        }
    }
}

fn build_predicate(rules: &[Rule]) -> Grd {
    let mut g = empty_grd(rules.len());
    fill_edges(&mut g, rules, predicate_edge);
    g
}

fn build_unifier(rules: &[Rule]) -> Grd {
    let mut g = empty_grd(rules.len());
    fill_edges(&mut g, rules, unifier_edge);
    g
}

/// Hybrid mode (spec 4.8): predicate-mode SCCs first, then refine edges
/// within each non-trivial SCC using the precise unifier check.
fn build_hybrid(rules: &[Rule]) -> Grd {
    let mut g = build_predicate(rules);
    let sccs = petgraph::algo::tarjan_scc(&g.graph);
    for scc in sccs {
        if scc.len() < 2 {
            continue;
        }
        let members: HashSet<NodeIndex> = scc.iter().copied().collect();
        let to_remove: Vec<_> = g
            .graph
            .edge_indices()
            .filter(|e| {
                let (a, b) = g.graph.edge_endpoints(*e).unwrap();
                members.contains(&a) && members.contains(&b)
            })
            .collect();
        for e in to_remove {
            g.graph.remove_edge(e);
        }
        for &a in &scc {
            for &b in &scc {
                let ra = &rules[g.rule_index_of(a)];
                let rb = &rules[g.rule_index_of(b)];
                let (positive, negative) = unifier_edge(ra, rb);
                if positive {
                    g.graph.add_edge(a, b, GrdEdge { negative: false });
                }
                if negative {
                    g.graph.add_edge(a, b, GrdEdge { negative: true });
                }
            }
        }
    }
    g
}

pub fn build(rules: &[Rule], mode: GrdMode) -> Grd {
    match mode {
        GrdMode::Predicate => build_predicate(rules),
        GrdMode::Unifier => build_unifier(rules),
        GrdMode::Hybrid => build_hybrid(rules),
    }
}
