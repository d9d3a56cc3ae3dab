//! Function-term rewriting (spec 4.4 step 2): every `EvaluableFunctionTerm`
//! reachable from an atom's arguments is pulled out into its own
//! constraint atom over a reserved `__eval_<fn>` predicate (spec 3,
//! `Interner::reserved_function_predicate`), binding a fresh variable to
//! the function's result. Shared by the atomic and conjunctive
//! evaluators so both see only plain atoms by the time they reach the
//! homomorphism search.

use crate::atom::Atom;
use crate::formula::Formula;
use crate::term::{Interner, Term};

/// Rewrite one atom, returning the rewritten atom (evaluable terms
/// replaced by fresh variables) plus the constraint atoms introduced.
pub fn rewrite_atom(atom: &Atom, interner: &Interner) -> (Atom, Vec<Atom>) {
    let mut constraints = Vec::new();
    let args = atom
        .args
        .iter()
        .map(|arg| extract(arg, interner, &mut constraints))
        .collect();
    (Atom::new_unchecked(atom.predicate, args), constraints)
}

fn extract(term: &Term, interner: &Interner, constraints: &mut Vec<Atom>) -> Term {
    match term {
        Term::Variable(_) | Term::Constant(_) | Term::Literal(_) => term.clone(),
        Term::LogicalFunctionTerm(f, args) => {
            let rewritten = args.iter().map(|a| extract(a, interner, constraints)).collect();
            Term::LogicalFunctionTerm(*f, rewritten)
        }
        Term::EvaluableFunctionTerm(f, args) => {
            let rewritten_args: Vec<Term> =
                args.iter().map(|a| extract(a, interner, constraints)).collect();
            let result_var = interner.fresh("eval");
            let predicate = interner.reserved_function_predicate(*f, rewritten_args.len());
            let mut call_args = rewritten_args;
            call_args.push(Term::Variable(result_var));
            constraints.push(Atom::new_unchecked(predicate, call_args));
            Term::Variable(result_var)
        }
    }
}

/// Rewrite every atom reachable in `formula`, conjoining each atom's
/// introduced constraints alongside it.
pub fn rewrite_formula(formula: &Formula, interner: &Interner) -> Formula {
    match formula {
        Formula::Atom(a) => {
            let (rewritten, constraints) = rewrite_atom(a, interner);
            if constraints.is_empty() {
                Formula::Atom(rewritten)
            } else {
                let mut parts = vec![Formula::Atom(rewritten)];
                parts.extend(constraints.into_iter().map(Formula::Atom));
                Formula::Conjunction(parts)
            }
        }
        Formula::Conjunction(parts) => {
            Formula::Conjunction(parts.iter().map(|p| rewrite_formula(p, interner)).collect())
        }
        Formula::Disjunction(parts) => {
            Formula::Disjunction(parts.iter().map(|p| rewrite_formula(p, interner)).collect())
        }
        Formula::Negation(inner) => Formula::Negation(Box::new(rewrite_formula(inner, interner))),
        Formula::Existential(vars, inner) => {
            Formula::Existential(vars.clone(), Box::new(rewrite_formula(inner, interner)))
        }
        Formula::Universal(vars, inner) => {
            Formula::Universal(vars.clone(), Box::new(rewrite_formula(inner, interner)))
        }
    }
}
