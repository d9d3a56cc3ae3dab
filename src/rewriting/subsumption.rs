//! CQ subsumption (spec 4.7): `Q1` subsumes `Q2` iff there is a
//! homomorphism from `Q1` into `Q2` that fixes the shared answer
//! variables. Reduces to plain homomorphism search by freezing `Q2`'s
//! non-answer variables into fresh identity constants and reusing
//! [`crate::homomorphism::find_homomorphisms`] against the frozen atoms
//! as a [`FactBase`].

use crate::atom::Atom;
use crate::fact_base::FactBase;
use crate::homomorphism::{find_homomorphisms, StaticScheduler};
use crate::substitution::Substitution;
use crate::term::{Interner, Term, Variable};

fn freeze(atoms: &[Atom], keep: &[Variable], interner: &Interner) -> (Vec<Atom>, Substitution) {
    let mut subst = Substitution::new();
    for atom in atoms {
        for v in atom.free_variables() {
            if keep.contains(&v) || subst.contains(v) {
                continue;
            }
            let c = interner.intern_identity_constant("_frozen");
            subst.bind(v, Term::Constant(c));
        }
    }
    let frozen = atoms
        .iter()
        .map(|a| Atom::new_unchecked(a.predicate, a.args.iter().map(|t| subst.apply_term(t)).collect()))
        .collect();
    (frozen, subst)
}

/// Whether `source` (atoms, answer_vars) subsumes `target`: a homomorphism
/// exists from `source` into `target` mapping `source`'s answer variables
/// onto `target`'s, position by position.
pub fn subsumes(
    source_atoms: &[Atom],
    source_answer_vars: &[Variable],
    target_atoms: &[Atom],
    target_answer_vars: &[Variable],
    interner: &Interner,
) -> bool {
    if source_answer_vars.len() != target_answer_vars.len() {
        return false;
    }
    let (frozen_target, _) = freeze(target_atoms, target_answer_vars, interner);
    let mut fb = FactBase::new("subsumption-target");
    for atom in &frozen_target {
        fb.add(atom.predicate, atom.args.clone());
    }

    let mut seed = Substitution::new();
    for (s, t) in source_answer_vars.iter().zip(target_answer_vars) {
        seed.bind(*s, Term::Variable(*t));
    }

    find_homomorphisms(source_atoms, &fb, interner, &StaticScheduler, &seed)
        .map(|results| !results.is_empty())
        .unwrap_or(false)
}
