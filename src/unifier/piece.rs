//! Single-disjunct piece unifiers (spec 4.6): a subset of a rule's head
//! atoms, a subset of the query's atoms ("the piece"), and a term
//! partition relating them, closed under existential isolation.

use crate::atom::Atom;
use crate::partition::TermPartition;
use crate::rule::Rule;
use crate::term::Variable;
use std::collections::HashSet;

/// One most-general piece unifier between a query and a single head
/// disjunct: `head_atoms`/`query_atoms` index into the atom lists the
/// caller enumerated against.
#[derive(Debug, Clone)]
pub struct PieceUnifier {
    pub head_atoms: Vec<usize>,
    pub query_atoms: Vec<usize>,
    pub partition: TermPartition,
}

impl PieceUnifier {
    /// Rewrite `query_atoms`, replacing the piece (`self.query_atoms`)
    /// with the rule's body, substituting every term by its partition's
    /// canonical representative (spec 4.7 step 2).
    pub fn rewrite(&self, query_atoms: &[Atom], rule: &Rule) -> Vec<Atom> {
        let body_atoms: Vec<Atom> = rule.body.atoms().into_iter().cloned().collect();
        let piece: HashSet<usize> = self.query_atoms.iter().copied().collect();

        let remap = |atom: &Atom| -> Atom {
            let args = atom
                .args
                .iter()
                .map(|t| match self.partition.find(t) {
                    Some(class) => self.partition.class_members(class)[0].clone(),
                    None => t.clone(),
                })
                .collect();
            Atom::new_unchecked(atom.predicate, args)
        };

        let mut out: Vec<Atom> = query_atoms
            .iter()
            .enumerate()
            .filter(|(i, _)| !piece.contains(i))
            .map(|(_, a)| remap(a))
            .collect();
        out.extend(body_atoms.iter().map(remap));
        out
    }
}

/// Existential-variable closure of a head-atom seed set: repeatedly add
/// any head atom sharing an existential variable with an already-included
/// atom, until fixpoint (spec 4.6, "existential isolation").
fn existential_closure(
    seed: HashSet<usize>,
    head_atoms: &[&Atom],
    existentials: &HashSet<Variable>,
) -> HashSet<usize> {
    let mut current = seed;
    loop {
        let mut vars_in_scope: HashSet<Variable> = HashSet::new();
        for &idx in &current {
            for v in head_atoms[idx].free_variables() {
                if existentials.contains(&v) {
                    vars_in_scope.insert(v);
                }
            }
        }
        let mut grew = false;
        for (idx, atom) in head_atoms.iter().enumerate() {
            if current.contains(&idx) {
                continue;
            }
            if atom.free_variables().iter().any(|v| vars_in_scope.contains(v)) {
                current.insert(idx);
                grew = true;
            }
        }
        if !grew {
            return current;
        }
    }
}

/// Try to assign each head atom in `head_subset` to a distinct query atom
/// of matching predicate, building a consistent term partition. Returns
/// every consistent assignment found (there may be several when the query
/// or head has repeated predicates).
fn assign(
    head_subset: &[usize],
    head_atoms: &[&Atom],
    query_atoms: &[Atom],
    used: &mut HashSet<usize>,
    partition: &TermPartition,
    assignment: &mut Vec<(usize, usize)>,
    out: &mut Vec<PieceUnifier>,
) {
    if assignment.len() == head_subset.len() {
        let mut head_ids: Vec<usize> = assignment.iter().map(|(h, _)| *h).collect();
        let mut query_ids: Vec<usize> = assignment.iter().map(|(_, q)| *q).collect();
        head_ids.sort_unstable();
        query_ids.sort_unstable();
        out.push(PieceUnifier {
            head_atoms: head_ids,
            query_atoms: query_ids,
            partition: partition.clone(),
        });
        return;
    }
    let h_idx = head_subset[assignment.len()];
    let h_atom = head_atoms[h_idx];
    for (q_idx, q_atom) in query_atoms.iter().enumerate() {
        if used.contains(&q_idx) || q_atom.predicate != h_atom.predicate {
            continue;
        }
        let mut candidate = partition.clone();
        let mut ok = true;
        for (ha, qa) in h_atom.args.iter().zip(&q_atom.args) {
            if !candidate.union(ha, qa) {
                ok = false;
                break;
            }
        }
        if !ok {
            continue;
        }
        used.insert(q_idx);
        assignment.push((h_idx, q_idx));
        assign(head_subset, head_atoms, query_atoms, used, &candidate, assignment, out);
        assignment.pop();
        used.remove(&q_idx);
    }
}

/// Enumerate every most-general piece unifier between `query_atoms` and
/// one head disjunct of `rule` (spec 4.6). Seeds the search from every
/// head-atom/query-atom pair of matching predicate, closes each seed
/// under existential isolation, then enumerates every way to complete the
/// piece with distinct query atoms.
pub fn enumerate_piece_unifiers(
    query_atoms: &[Atom],
    rule: &Rule,
    head_disjunct: &[&Atom],
) -> Vec<PieceUnifier> {
    let existentials: HashSet<Variable> = rule.existential_variables().into_iter().collect();
    let mut seen_head_subsets: HashSet<Vec<usize>> = HashSet::new();
    let mut out = Vec::new();

    for (h_idx, h_atom) in head_disjunct.iter().enumerate() {
        for q_atom in query_atoms {
            if q_atom.predicate != h_atom.predicate {
                continue;
            }
            let mut seed = HashSet::new();
            seed.insert(h_idx);
            let closed = existential_closure(seed, head_disjunct, &existentials);
            let mut head_subset: Vec<usize> = closed.into_iter().collect();
            head_subset.sort_unstable();
            if !seen_head_subsets.insert(head_subset.clone()) {
                continue;
            }
            let mut used = HashSet::new();
            let mut assignment = Vec::new();
            assign(
                &head_subset,
                head_disjunct,
                query_atoms,
                &mut used,
                &TermPartition::new(),
                &mut assignment,
                &mut out,
            );
        }
    }
    out
}
