//! `ComputedSource`: a [`ReadableData`] backend that evaluates computed
//! predicates (arithmetic/string functions, equality, comparisons)
//! in place of storing them (spec 4.5). Every computed predicate is a
//! *functional* relation — at most one row ever comes back — which lets
//! reversible functions recover a missing argument instead of only
//! checking a fully-bound tuple.

use super::function::{
    Add, Average, CollectionContains, CollectionSize, CollectionUnion, Concat, ComputedFunction,
    DictContainsKey, DictGet, Div, Length, Max, Median, Min, Mul, ParseFloat, ParseInt, Power,
    RegexMatch, RegexReplace, Sub, ToLower, ToStringFn, ToUpper, TupleGet,
};
use crate::data_source::{AtomicPattern, BasicQuery, ReadableData};
use crate::error::EngineError;
use crate::term::{ComparisonOp, Interner, Predicate, Term};
use crate::value::Value;
use std::collections::HashMap;

enum ComputedOp {
    Function(Box<dyn ComputedFunction>),
    Equality,
    Comparison(ComparisonOp),
}

/// Holds the session `Interner` so it can intern new literal results
/// (e.g. `2 + 3` producing the literal `5`) with the same dedup guarantee
/// as every other literal in the session (spec 8 invariant 3).
pub struct ComputedSource<'a> {
    interner: &'a Interner,
    ops: HashMap<Predicate, ComputedOp>,
    name: String,
}

impl<'a> ComputedSource<'a> {
    /// Register the standard function library (spec 4.5) plus the
    /// reserved equality/comparison predicates.
    pub fn new(interner: &'a Interner) -> Self {
        let mut source = ComputedSource {
            interner,
            ops: HashMap::new(),
            name: "computed".to_string(),
        };
        source.register_function("plus", Box::new(Add));
        source.register_function("minus", Box::new(Sub));
        source.register_function("times", Box::new(Mul));
        source.register_function("div", Box::new(Div));
        source.register_function("concat", Box::new(Concat));
        source.register_function("length", Box::new(Length));
        source.register_function("to_upper", Box::new(ToUpper));
        source.register_function("to_lower", Box::new(ToLower));
        source.register_function("to_string", Box::new(ToStringFn));
        source.register_function("parse_int", Box::new(ParseInt));
        source.register_function("parse_float", Box::new(ParseFloat));
        source.register_function("regex_match", Box::new(RegexMatch));
        source.register_function("regex_replace", Box::new(RegexReplace));
        source.register_function("average", Box::new(Average));
        source.register_function("min", Box::new(Min));
        source.register_function("max", Box::new(Max));
        source.register_function("median", Box::new(Median));
        source.register_function("power", Box::new(Power));
        source.register_function("collection_size", Box::new(CollectionSize));
        source.register_function("collection_contains", Box::new(CollectionContains));
        source.register_function("collection_union", Box::new(CollectionUnion));
        source.register_function("tuple_get", Box::new(TupleGet));
        source.register_function("dict_get", Box::new(DictGet));
        source.register_function("dict_contains_key", Box::new(DictContainsKey));

        let eq = interner.reserved_equality_predicate();
        source.ops.insert(eq, ComputedOp::Equality);
        for op in [ComparisonOp::Lt, ComparisonOp::Gt, ComparisonOp::Le, ComparisonOp::Ge, ComparisonOp::Ne] {
            let pred = interner.reserved_comparison_predicate(op);
            source.ops.insert(pred, ComputedOp::Comparison(op));
        }
        source
    }

    /// Every predicate this source can answer — equality, comparisons,
    /// and the registered function library. Used to wire a
    /// `ComputedSource` into a query's [`crate::evaluator::SourceRegistry`]
    /// without the caller needing to know the function library in advance.
    pub fn predicates(&self) -> impl Iterator<Item = Predicate> + '_ {
        self.ops.keys().copied()
    }

    fn register_function(&mut self, name: &str, f: Box<dyn ComputedFunction>) {
        let symbol = self.interner.intern_function(name);
        let predicate = self.interner.reserved_function_predicate(symbol, f.arity());
        self.ops.insert(predicate, ComputedOp::Function(f));
    }

    fn term_to_value(&self, term: &Term) -> Result<Value, EngineError> {
        match term {
            Term::Literal(l) => Ok(self.interner.literal_value(*l).0),
            other => Err(EngineError::Evaluation {
                source_name: self.name.clone(),
                message: format!("computed predicate argument is not a literal: {other:?}"),
            }),
        }
    }

    fn value_to_term(&self, value: Value) -> Term {
        let datatype = value.data_type();
        Term::Literal(self.interner.intern_literal(value, datatype))
    }

    fn bound_value(&self, query: &BasicQuery, pos: usize) -> Option<Result<Value, EngineError>> {
        query.bound_positions.get(&pos).map(|t| self.term_to_value(t))
    }

    fn evaluate_function(
        &self,
        query: &BasicQuery,
        f: &dyn ComputedFunction,
    ) -> Result<Vec<Vec<Term>>, EngineError> {
        let total = f.arity() + 1;
        let mut values: Vec<Option<Value>> = Vec::with_capacity(total);
        for pos in 0..total {
            match self.bound_value(query, pos) {
                Some(v) => values.push(Some(v?)),
                None => values.push(None),
            }
        }
        let missing: Vec<usize> = (0..total).filter(|i| values[*i].is_none()).collect();

        match missing.as_slice() {
            [] => {
                let args: Vec<Value> = values[..f.arity()].iter().map(|v| v.clone().unwrap()).collect();
                let result = values[f.arity()].clone().unwrap();
                match f.forward(&args) {
                    Some(computed) if computed == result => Ok(vec![Vec::new()]),
                    _ => Ok(Vec::new()),
                }
            }
            [idx] if *idx == f.arity() => {
                let args: Vec<Value> = values[..f.arity()].iter().map(|v| v.clone().unwrap()).collect();
                match f.forward(&args) {
                    Some(computed) => Ok(vec![vec![self.value_to_term(computed)]]),
                    None => Ok(Vec::new()),
                }
            }
            [idx] => {
                let result = values[f.arity()].clone().unwrap();
                match f.reverse(*idx, &values[..f.arity()], &result) {
                    Some(recovered) => Ok(vec![vec![self.value_to_term(recovered)]]),
                    None => Ok(Vec::new()),
                }
            }
            _ => Err(EngineError::UnsupportedFeature(format!(
                "computed function needs at most one unbound position, got {}",
                missing.len()
            ))),
        }
    }

    fn evaluate_equality(&self, query: &BasicQuery) -> Result<Vec<Vec<Term>>, EngineError> {
        let l = self.bound_value(query, 0).transpose()?;
        let r = self.bound_value(query, 1).transpose()?;
        match (l, r) {
            (Some(a), Some(b)) => Ok(if a == b { vec![Vec::new()] } else { Vec::new() }),
            (Some(a), None) => Ok(vec![vec![self.value_to_term(a)]]),
            (None, Some(b)) => Ok(vec![vec![self.value_to_term(b)]]),
            (None, None) => Err(EngineError::UnsupportedFeature(
                "equality over two unbound positions has infinitely many solutions".to_string(),
            )),
        }
    }

    fn evaluate_comparison(&self, query: &BasicQuery, op: ComparisonOp) -> Result<Vec<Vec<Term>>, EngineError> {
        let l = self.bound_value(query, 0).transpose()?;
        let r = self.bound_value(query, 1).transpose()?;
        let (a, b) = match (l, r) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(EngineError::UnsupportedFeature(
                    "comparison predicates cannot run with an unbound position".to_string(),
                ))
            }
        };
        let ord = a.partial_compare(&b);
        let holds = match (op, ord) {
            (ComparisonOp::Lt, Some(o)) => o.is_lt(),
            (ComparisonOp::Gt, Some(o)) => o.is_gt(),
            (ComparisonOp::Le, Some(o)) => o.is_le(),
            (ComparisonOp::Ge, Some(o)) => o.is_ge(),
            (ComparisonOp::Ne, ord) => ord != Some(std::cmp::Ordering::Equal),
            (_, None) => false,
        };
        Ok(if holds { vec![Vec::new()] } else { Vec::new() })
    }
}

impl<'a> ReadableData for ComputedSource<'a> {
    fn evaluate<'b>(
        &'b self,
        query: &BasicQuery,
    ) -> Result<Box<dyn Iterator<Item = Vec<Term>> + 'b>, EngineError> {
        let rows = match self.ops.get(&query.predicate) {
            Some(ComputedOp::Function(f)) => self.evaluate_function(query, f.as_ref())?,
            Some(ComputedOp::Equality) => self.evaluate_equality(query)?,
            Some(ComputedOp::Comparison(op)) => self.evaluate_comparison(query, *op)?,
            None => {
                return Err(EngineError::Evaluation {
                    source_name: self.name.clone(),
                    message: "predicate is not a registered computed predicate".to_string(),
                })
            }
        };
        Ok(Box::new(rows.into_iter()))
    }

    fn pattern(&self) -> AtomicPattern {
        AtomicPattern::default()
    }

    fn can_evaluate(&self, query: &BasicQuery) -> bool {
        self.ops.contains_key(&query.predicate)
    }

    fn estimate_bound(&self, _query: &BasicQuery) -> Option<usize> {
        Some(1)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Interner;
    use crate::value::DataType;

    #[test]
    fn forward_evaluates_plus() {
        let it = Interner::new();
        let source = ComputedSource::new(&it);
        let plus = it.intern_function("plus");
        let pred = it.reserved_function_predicate(plus, 2);

        let two = Term::Literal(it.intern_literal(Value::Integer(2), DataType::Integer));
        let three = Term::Literal(it.intern_literal(Value::Integer(3), DataType::Integer));
        let x = it.intern_variable("X");
        let query = BasicQuery::new(pred).with_bound(0, two).with_bound(1, three).with_answer(2, x);

        let rows: Vec<_> = source.evaluate(&query).unwrap().collect();
        assert_eq!(rows.len(), 1);
        match &rows[0][0] {
            Term::Literal(l) => assert_eq!(it.literal_value(*l).0, Value::Integer(5)),
            _ => panic!("expected a literal"),
        }
    }

    #[test]
    fn reverse_recovers_a_missing_argument() {
        // spec 8, invariant 11
        let it = Interner::new();
        let source = ComputedSource::new(&it);
        let plus = it.intern_function("plus");
        let pred = it.reserved_function_predicate(plus, 2);

        let two = Term::Literal(it.intern_literal(Value::Integer(2), DataType::Integer));
        let five = Term::Literal(it.intern_literal(Value::Integer(5), DataType::Integer));
        let y = it.intern_variable("Y");
        let query = BasicQuery::new(pred).with_bound(0, two).with_answer(1, y).with_bound(2, five);

        let rows: Vec<_> = source.evaluate(&query).unwrap().collect();
        assert_eq!(rows.len(), 1);
        match &rows[0][0] {
            Term::Literal(l) => assert_eq!(it.literal_value(*l).0, Value::Integer(3)),
            _ => panic!("expected a literal"),
        }
    }

    #[test]
    fn comparison_checks_both_bound_positions() {
        let it = Interner::new();
        let source = ComputedSource::new(&it);
        let pred = it.reserved_comparison_predicate(ComparisonOp::Lt);
        let two = Term::Literal(it.intern_literal(Value::Integer(2), DataType::Integer));
        let five = Term::Literal(it.intern_literal(Value::Integer(5), DataType::Integer));
        let query = BasicQuery::new(pred).with_bound(0, two).with_bound(1, five);
        let rows: Vec<_> = source.evaluate(&query).unwrap().collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_empty());
    }

    #[test]
    fn equality_binds_the_unbound_side() {
        let it = Interner::new();
        let source = ComputedSource::new(&it);
        let pred = it.reserved_equality_predicate();
        let a = Term::Literal(it.intern_literal(Value::Integer(7), DataType::Integer));
        let x = it.intern_variable("X");
        let query = BasicQuery::new(pred).with_bound(0, a).with_answer(1, x);
        let rows: Vec<_> = source.evaluate(&query).unwrap().collect();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn average_reverse_recovers_a_missing_side() {
        // spec 8, invariant 11
        let it = Interner::new();
        let source = ComputedSource::new(&it);
        let average = it.intern_function("average");
        let pred = it.reserved_function_predicate(average, 2);

        let four = Term::Literal(it.intern_literal(Value::Integer(4), DataType::Integer));
        let seven = Term::Literal(it.intern_literal(Value::Integer(7), DataType::Integer));
        let y = it.intern_variable("Y");
        let query = BasicQuery::new(pred).with_bound(0, four).with_answer(1, y).with_bound(2, seven);

        let rows: Vec<_> = source.evaluate(&query).unwrap().collect();
        assert_eq!(rows.len(), 1);
        match &rows[0][0] {
            Term::Literal(l) => assert_eq!(it.literal_value(*l).0, Value::Integer(10)),
            _ => panic!("expected a literal"),
        }
    }

    #[test]
    fn collection_size_over_a_set_literal() {
        let it = Interner::new();
        let source = ComputedSource::new(&it);
        let size = it.intern_function("collection_size");
        let pred = it.reserved_function_predicate(size, 1);

        let set = Value::Set(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let set_term = Term::Literal(it.intern_literal(set, DataType::Set));
        let x = it.intern_variable("X");
        let query = BasicQuery::new(pred).with_bound(0, set_term).with_answer(1, x);

        let rows: Vec<_> = source.evaluate(&query).unwrap().collect();
        match &rows[0][0] {
            Term::Literal(l) => assert_eq!(it.literal_value(*l).0, Value::Integer(3)),
            _ => panic!("expected a literal"),
        }
    }

    #[test]
    fn two_unbound_positions_on_a_function_is_unsupported() {
        let it = Interner::new();
        let source = ComputedSource::new(&it);
        let plus = it.intern_function("plus");
        let pred = it.reserved_function_predicate(plus, 2);
        let x = it.intern_variable("X");
        let y = it.intern_variable("Y");
        let query = BasicQuery::new(pred).with_answer(0, x).with_answer(1, y);
        assert!(source.evaluate(&query).is_err());
    }
}
