//! Stratification strategies (spec 4.9): assign each rule a stratum such
//! that every negative edge points strictly backward. SCC and
//! shortest-path computation are delegated to `petgraph`; only the
//! orchestration — how a strategy turns SCC levels into rule strata —
//! lives here.

use serde::{Deserialize, Serialize};
use super::graph::Grd;
use crate::error::EngineError;
use crate::rule::Rule;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StratificationStrategy {
    ByScc,
    Minimal,
    SingleEvaluation,
    MinimalEvaluation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stratum {
    pub rule_indices: Vec<usize>,
}

/// SCC condensation: one node per SCC, with a positive/negative edge
/// whenever any member of SCC `a` has an edge of that kind to any member
/// of SCC `b` (`a != b` — internal edges don't constrain cross-stratum
/// ordering).
struct Condensation {
    sccs: Vec<Vec<NodeIndex>>,
    scc_of: HashMap<NodeIndex, usize>,
    /// `edges[(a, b)] = has_negative_edge`
    edges: HashMap<(usize, usize), bool>,
}

fn condense(grd: &Grd) -> Condensation {
    let sccs = petgraph::algo::tarjan_scc(&grd.graph);
    let mut scc_of = HashMap::new();
    for (i, scc) in sccs.iter().enumerate() {
        for &n in scc {
            scc_of.insert(n, i);
        }
    }
    let mut edges: HashMap<(usize, usize), bool> = HashMap::new();
    for e in grd.graph.edge_indices() {
        let (a, b) = grd.graph.edge_endpoints(e).unwrap();
        let sa = scc_of[&a];
        let sb = scc_of[&b];
        if sa == sb {
            continue;
        }
        let negative = grd.graph[e].negative;
        let entry = edges.entry((sa, sb)).or_insert(false);
        *entry = *entry || negative;
    }
    Condensation { sccs, scc_of, edges }
}

/// A plain graph over SCC indices, used only to get a topological order —
/// independent of whatever internal order `tarjan_scc` happens to return.
fn condensation_graph(cond: &Condensation) -> petgraph::graph::DiGraph<usize, ()> {
    let mut g = petgraph::graph::DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..cond.sccs.len()).map(|i| g.add_node(i)).collect();
    for &(a, b) in cond.edges.keys() {
        g.add_edge(nodes[a], nodes[b], ());
    }
    g
}

fn topo_levels(cond: &Condensation) -> Vec<usize> {
    let g = condensation_graph(cond);
    let order = petgraph::algo::toposort(&g, None).expect("condensation is acyclic by construction");
    let mut levels = vec![0usize; cond.sccs.len()];
    for (level, node) in order.into_iter().enumerate() {
        levels[g[node]] = level;
    }
    levels
}

fn has_internal_negative_edge(grd: &Grd, scc: &[NodeIndex]) -> bool {
    let members: std::collections::HashSet<NodeIndex> = scc.iter().copied().collect();
    grd.graph.edge_indices().any(|e| {
        let (a, b) = grd.graph.edge_endpoints(e).unwrap();
        members.contains(&a) && members.contains(&b) && grd.graph[e].negative
    })
}

fn levels_to_strata(grd: &Grd, cond: &Condensation, levels: &[usize]) -> Vec<Stratum> {
    let max_level = levels.iter().copied().max().unwrap_or(0);
    let mut strata: Vec<Vec<usize>> = vec![Vec::new(); max_level + 1];
    for (scc_idx, scc) in cond.sccs.iter().enumerate() {
        let level = levels[scc_idx];
        for &n in scc {
            strata[level].push(grd.rule_index_of(n));
        }
    }
    strata
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|mut rule_indices| {
            rule_indices.sort_unstable();
            Stratum { rule_indices }
        })
        .collect()
}

/// by-SCC: one stratum per SCC in topological order. Fails if any SCC
/// contains a negative edge (self-loop or internal cycle).
fn by_scc(grd: &Grd, cond: &Condensation, rules: &[Rule]) -> Result<Vec<usize>, EngineError> {
    for scc in &cond.sccs {
        if has_internal_negative_edge(grd, scc) {
            let names: Vec<String> = scc.iter().map(|n| format!("rule#{}", grd.rule_index_of(*n))).collect();
            let _ = rules;
            return Err(EngineError::Stratification(names));
        }
    }
    Ok(topo_levels(cond))
}

/// minimal: Bellman-Ford over the SCC condensation, edge weight 0 for
/// positive, 1 for negative. Fails on a negative cycle (impossible to
/// stratify).
fn minimal(grd: &Grd, cond: &Condensation) -> Result<Vec<usize>, EngineError> {
    bellman_ford_levels(grd, cond, true)
}

fn single_evaluation(grd: &Grd, cond: &Condensation) -> Result<Vec<usize>, EngineError> {
    bellman_ford_levels(grd, cond, false)
}

/// Shared Bellman-Ford longest-path computation over the SCC DAG.
/// `minimal_weights`: true assigns weight 0 to positive edges (minimal
/// stratification); false assigns weight 1 to every inter-SCC edge
/// (single-evaluation: force strict ordering).
fn bellman_ford_levels(grd: &Grd, cond: &Condensation, minimal_weights: bool) -> Result<Vec<usize>, EngineError> {
    let n = cond.sccs.len();
    // Longest path from any source, where edge (a -> b) has weight 1 if it
    // must force b strictly after a, else 0. Cycles in the condensation
    // can't exist (it's an SCC DAG) so this always terminates; a negative
    // weight cycle can't arise either, but relaxation could still loop
    // forever on a malformed edge set, so cap iterations at n + 1.
    let mut level = vec![0i64; n];
    let edges: Vec<((usize, usize), i64)> = cond
        .edges
        .iter()
        .map(|(&(a, b), &negative)| {
            let weight = if minimal_weights {
                if negative {
                    1
                } else {
                    0
                }
            } else {
                1
            };
            ((a, b), weight)
        })
        .collect();

    for _ in 0..=n {
        let mut changed = false;
        for &((a, b), w) in &edges {
            if level[a] + w > level[b] {
                level[b] = level[a] + w;
                changed = true;
            }
        }
        if !changed {
            return Ok(level.into_iter().map(|l| l as usize).collect());
        }
    }
    let _ = grd;
    Err(EngineError::Stratification(vec![
        "negative cycle in GRD condensation".to_string(),
    ]))
}

/// minimal-evaluation: like single-evaluation, but SCCs with no ordering
/// constraint between them share the lowest level both can occupy
/// (computed the same way `single_evaluation` does — `bellman_ford_levels`
/// already assigns the minimum level consistent with the constraints, so
/// independent SCCs naturally collapse to level 0 together).
fn minimal_evaluation(grd: &Grd, cond: &Condensation) -> Result<Vec<usize>, EngineError> {
    bellman_ford_levels(grd, cond, false)
}

pub fn stratify(rules: &[Rule], grd: &Grd, strategy: StratificationStrategy) -> Result<Vec<Stratum>, EngineError> {
    let cond = condense(grd);
    let levels = match strategy {
        StratificationStrategy::ByScc => by_scc(grd, &cond, rules)?,
        StratificationStrategy::Minimal => minimal(grd, &cond)?,
        StratificationStrategy::SingleEvaluation => single_evaluation(grd, &cond)?,
        StratificationStrategy::MinimalEvaluation => minimal_evaluation(grd, &cond)?,
    };
    Ok(levels_to_strata(grd, &cond, &levels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::formula::Formula;
    use crate::grd::graph::{build, GrdMode};
    use crate::term::{Interner, Term};

    fn atom(it: &Interner, name: &str, args: Vec<Term>) -> Atom {
        let p = it.intern_predicate(name, args.len());
        Atom::new_unchecked(p, args)
    }

    #[test]
    fn by_scc_orders_a_simple_chain() {
        // r(X) :- p(X);  p(X) :- q(X)
        let it = Interner::new();
        let x = Term::Variable(it.intern_variable("X"));
        let r1 = Rule::new(
            Formula::Atom(atom(&it, "p", vec![x.clone()])),
            Formula::Atom(atom(&it, "r", vec![x.clone()])),
        )
        .unwrap();
        let r2 = Rule::new(
            Formula::Atom(atom(&it, "q", vec![x.clone()])),
            Formula::Atom(atom(&it, "p", vec![x])),
        )
        .unwrap();
        let rules = vec![r1, r2];
        let grd = build(&rules, GrdMode::Predicate);
        let strata = stratify(&rules, &grd, StratificationStrategy::ByScc).unwrap();
        assert_eq!(strata.len(), 2);
        // r2 (produces p, consumed by r1) must come before r1.
        let stratum_of = |idx: usize| strata.iter().position(|s| s.rule_indices.contains(&idx)).unwrap();
        assert!(stratum_of(1) < stratum_of(0));
    }

    #[test]
    fn by_scc_rejects_a_negative_self_loop() {
        // p(X) :- q(X), not p(X)  -- nonsensical but must be rejected, not looped on
        let it = Interner::new();
        let x = Term::Variable(it.intern_variable("X"));
        let body = Formula::conjunction(vec![
            Formula::Atom(atom(&it, "q", vec![x.clone()])),
            Formula::Negation(Box::new(Formula::Atom(atom(&it, "p", vec![x.clone()])))),
        ]);
        let r1 = Rule::new(body, Formula::Atom(atom(&it, "p", vec![x]))).unwrap();
        let rules = vec![r1];
        let grd = build(&rules, GrdMode::Predicate);
        assert!(stratify(&rules, &grd, StratificationStrategy::ByScc).is_err());
    }

    #[test]
    fn minimal_puts_independent_rules_in_the_same_stratum() {
        let it = Interner::new();
        let x = Term::Variable(it.intern_variable("X"));
        let r1 = Rule::new(
            Formula::Atom(atom(&it, "a", vec![x.clone()])),
            Formula::Atom(atom(&it, "p", vec![x.clone()])),
        )
        .unwrap();
        let r2 = Rule::new(
            Formula::Atom(atom(&it, "b", vec![x.clone()])),
            Formula::Atom(atom(&it, "q", vec![x])),
        )
        .unwrap();
        let rules = vec![r1, r2];
        let grd = build(&rules, GrdMode::Predicate);
        let strata = stratify(&rules, &grd, StratificationStrategy::Minimal).unwrap();
        assert_eq!(strata.len(), 1);
        assert_eq!(strata[0].rule_indices, vec![0, 1]);
    }
}
