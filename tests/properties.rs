//! Property-based tests for the invariants in spec 8.

use existential_core::atom::Atom;
use existential_core::computed::ComputedSource;
use existential_core::data_source::{BasicQuery, ReadableData};
use existential_core::fact_base::FactBase;
use existential_core::formula::Formula;
use existential_core::grd::{build, stratify, GrdMode, StratificationStrategy};
use existential_core::rule::Rule;
use existential_core::substitution::Substitution;
use existential_core::term::{Interner, Term};
use existential_core::value::{DataType, Value};
use proptest::prelude::*;

fn chain_substitution(it: &Interner, names: &[&str], depth: usize) -> (Substitution, Term) {
    // X0 -> X1 -> ... -> X{depth-1} -> "leaf", then ask about X0.
    let vars: Vec<_> = names.iter().take(depth).map(|n| it.intern_variable(n)).collect();
    let leaf = Term::Constant(it.intern_constant("leaf"));
    let mut subst = Substitution::new();
    for w in vars.windows(2) {
        subst.bind(w[0], Term::Variable(w[1]));
    }
    if let Some(&last) = vars.last() {
        subst.bind(last, leaf.clone());
    }
    (subst, Term::Variable(vars[0]))
}

proptest! {
    /// Invariant 1: normalize is idempotent.
    #[test]
    fn normalize_is_idempotent(depth in 1usize..6) {
        let it = Interner::new();
        let names = ["X0", "X1", "X2", "X3", "X4", "X5"];
        let (subst, _) = chain_substitution(&it, &names, depth);
        let once = subst.normalize();
        let twice = once.normalize();
        prop_assert_eq!(once, twice);
    }

    /// Invariant 2: `(sigma . tau).apply(x) == sigma.apply(tau.apply(x))`.
    #[test]
    fn compose_matches_sequential_application(a in 0i64..50, b in 0i64..50) {
        let it = Interner::new();
        let x = it.intern_variable("X");
        let y = it.intern_variable("Y");
        let av = Term::Literal(it.intern_literal(Value::Integer(a), DataType::Integer));
        let bv = Term::Literal(it.intern_literal(Value::Integer(b), DataType::Integer));

        let tau = Substitution::singleton(x, Term::Variable(y));
        let sigma = Substitution::singleton(y, bv.clone());
        let _ = av;

        let composed = sigma.compose(&tau);
        let sequential = sigma.apply_term(&tau.apply_term(&Term::Variable(x)));
        prop_assert_eq!(composed.apply_term(&Term::Variable(x)), sequential);
    }

    /// Invariant 3: interning is deduplicating and id-stable.
    #[test]
    fn interning_deduplicates_equal_payloads(n in 1usize..20) {
        let it = Interner::new();
        let name = format!("const_{n}");
        let a = it.intern_constant(&name);
        let b = it.intern_constant(&name);
        prop_assert_eq!(a, b);

        let other = it.intern_constant(&format!("{name}_other"));
        prop_assert_ne!(a, other);
    }

    /// Invariant 4: every added atom round-trips through a matching query.
    #[test]
    fn fact_base_round_trips_an_added_atom(a in 0i64..100, b in 0i64..100) {
        let it = Interner::new();
        let p = it.intern_predicate("p", 2);
        let mut fb = FactBase::new("facts");
        let av = Term::Literal(it.intern_literal(Value::Integer(a), DataType::Integer));
        let bv = Term::Literal(it.intern_literal(Value::Integer(b), DataType::Integer));
        fb.add(p, vec![av.clone(), bv.clone()]);

        let x = it.intern_variable("X");
        let y = it.intern_variable("Y");
        let query = BasicQuery::new(p)
            .with_bound(0, av.clone())
            .with_answer(1, y);
        let _ = x;
        let rows = fb.evaluate_query(&query);
        prop_assert_eq!(rows, vec![vec![bv]]);
    }

    /// Invariant 11: reversible computed functions round-trip a missing
    /// argument through forward re-evaluation.
    #[test]
    fn reversible_plus_round_trips(a in -1000i64..1000, b in -1000i64..1000) {
        let it = Interner::new();
        let source = ComputedSource::new(&it);
        let plus = it.intern_function("plus");
        let pred = it.reserved_function_predicate(plus, 2);

        let av = Term::Literal(it.intern_literal(Value::Integer(a), DataType::Integer));
        let sum = Term::Literal(it.intern_literal(Value::Integer(a + b), DataType::Integer));
        let y = it.intern_variable("Y");

        let query = BasicQuery::new(pred).with_bound(0, av).with_answer(1, y).with_bound(2, sum);
        let rows: Vec<_> = source.evaluate(&query).unwrap().collect();
        prop_assert_eq!(rows.len(), 1);
        match &rows[0][0] {
            Term::Literal(l) => prop_assert_eq!(it.literal_value(*l).0, Value::Integer(b)),
            other => prop_assert!(false, "expected a literal, got {other:?}"),
        }
    }

    /// Invariant 11: `average` is reversible too — recovering a missing
    /// side from the other side and the result.
    #[test]
    fn reversible_average_round_trips(a in -1000i64..1000, b in -1000i64..1000) {
        let it = Interner::new();
        let source = ComputedSource::new(&it);
        let average = it.intern_function("average");
        let pred = it.reserved_function_predicate(average, 2);

        let av = Term::Literal(it.intern_literal(Value::Integer(a), DataType::Integer));
        let mean = Term::Literal(it.intern_literal(Value::Float((a as f64 + b as f64) / 2.0), DataType::Float));
        let y = it.intern_variable("Y");

        let query = BasicQuery::new(pred).with_bound(0, av).with_answer(1, y).with_bound(2, mean);
        let rows: Vec<_> = source.evaluate(&query).unwrap().collect();
        prop_assert_eq!(rows.len(), 1);
        match &rows[0][0] {
            Term::Literal(l) => {
                let recovered = it.literal_value(*l).0.as_f64().unwrap();
                prop_assert!((recovered - b as f64).abs() < 1e-6);
            }
            other => prop_assert!(false, "expected a literal, got {other:?}"),
        }
    }

    /// Invariant 10: every negative GRD edge points strictly backward —
    /// the consumer's stratum is after the producer's.
    #[test]
    fn negative_edges_point_backward_in_stratification(negations in proptest::collection::vec(any::<bool>(), 1..6)) {
        let it = Interner::new();
        let x = Term::Variable(it.intern_variable("X"));
        let preds: Vec<_> = (0..=negations.len())
            .map(|i| it.intern_predicate(&format!("p{i}"), 1))
            .collect();

        let mut rules = Vec::new();
        for (i, &negated) in negations.iter().enumerate() {
            let prev = Formula::Atom(Atom::new_unchecked(preds[i], vec![x.clone()]));
            let body = if negated { Formula::Negation(Box::new(prev)) } else { prev };
            let head = Formula::Atom(Atom::new_unchecked(preds[i + 1], vec![x.clone()]));
            rules.push(Rule::new(body, head).unwrap());
        }

        let grd = build(&rules, GrdMode::Predicate);
        let strata = stratify(&rules, &grd, StratificationStrategy::ByScc).unwrap();
        let stratum_of: Vec<usize> = {
            let mut out = vec![0usize; rules.len()];
            for (level, stratum) in strata.iter().enumerate() {
                for &idx in &stratum.rule_indices {
                    out[idx] = level;
                }
            }
            out
        };

        for i in 1..rules.len() {
            if negations[i] {
                prop_assert!(stratum_of[i] > stratum_of[i - 1]);
            }
        }
    }
}
