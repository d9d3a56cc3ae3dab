//! Rule scheduling (spec 4.10 step 1): which rules are candidates for
//! this chase step.

use serde::{Deserialize, Serialize};
use crate::grd::Grd;
use crate::rule::Rule;
use crate::term::Predicate;
use petgraph::Direction;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerStrategy {
    Naive,
    ByPredicate,
    Grd,
}

fn rule_body_predicates(rule: &Rule) -> HashSet<Predicate> {
    rule.body.atoms().into_iter().map(|a| a.predicate).collect()
}

/// Schedule candidate rule indices for the next step.
///
/// `touched_predicates` / `touched_rules` describe what the *previous*
/// step created; both are empty on the first step, which every strategy
/// treats as "schedule everything" (nothing has been touched yet to
/// narrow the candidate set).
pub fn schedule(
    strategy: SchedulerStrategy,
    rules: &[Rule],
    touched_predicates: &HashSet<Predicate>,
    touched_rules: &HashSet<usize>,
    grd: Option<&Grd>,
) -> Vec<usize> {
    match strategy {
        SchedulerStrategy::Naive => (0..rules.len()).collect(),
        SchedulerStrategy::ByPredicate => {
            if touched_predicates.is_empty() {
                return (0..rules.len()).collect();
            }
            rules
                .iter()
                .enumerate()
                .filter(|(_, r)| rule_body_predicates(r).iter().any(|p| touched_predicates.contains(p)))
                .map(|(i, _)| i)
                .collect()
        }
        SchedulerStrategy::Grd => {
            let Some(grd) = grd else {
                return (0..rules.len()).collect();
            };
            if touched_rules.is_empty() {
                return (0..rules.len()).collect();
            }
            let mut out: HashSet<usize> = HashSet::new();
            for &r in touched_rules {
                let node = grd.node_of(r);
                for succ in grd.graph.neighbors_directed(node, Direction::Outgoing) {
                    out.insert(grd.rule_index_of(succ));
                }
            }
            let mut out: Vec<usize> = out.into_iter().collect();
            out.sort_unstable();
            out
        }
    }
}
