//! The computed-function library: arithmetic, string, and conversion
//! functions a `ComputedSource` evaluates in place of a stored fact
//! (spec 4.5). A function is "reversible" when [`ComputedFunction::reverse`]
//! can recover a missing argument from the result and the other
//! arguments — spec 8 invariant 11 exercises this for arithmetic.

use crate::value::Value;

/// One computed function, keyed into the source by its arity (the
/// number of input positions; the source adds one more for the result).
pub trait ComputedFunction: std::fmt::Debug + Send + Sync {
    fn arity(&self) -> usize;

    /// Compute the result from fully-bound arguments.
    fn forward(&self, args: &[Value]) -> Option<Value>;

    /// Recover the argument at `missing_index` given the other arguments
    /// (`None` at `missing_index`, `Some` elsewhere) and the known
    /// result. Returns `None` if this function has no reverse mode, or
    /// if this particular combination is unsolvable (e.g. division by a
    /// result of zero).
    fn reverse(&self, _missing_index: usize, _known_args: &[Option<Value>], _result: &Value) -> Option<Value> {
        None
    }
}

fn numeric_pair(args: &[Value]) -> Option<(f64, f64, bool)> {
    let both_int = matches!(args[0], Value::Integer(_)) && matches!(args[1], Value::Integer(_));
    Some((args[0].as_f64()?, args[1].as_f64()?, both_int))
}

fn numeric_result(v: f64, as_int: bool) -> Value {
    if as_int {
        Value::Integer(v as i64)
    } else {
        Value::Float(v)
    }
}

#[derive(Debug, Default)]
pub struct Add;
impl ComputedFunction for Add {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let (a, b, int) = numeric_pair(args)?;
        Some(numeric_result(a + b, int))
    }
    fn reverse(&self, missing_index: usize, known: &[Option<Value>], result: &Value) -> Option<Value> {
        let r = result.as_f64()?;
        let other = known.iter().flatten().next()?.as_f64()?;
        let int = matches!(result, Value::Integer(_));
        match missing_index {
            0 | 1 => Some(numeric_result(r - other, int)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Sub;
impl ComputedFunction for Sub {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let (a, b, int) = numeric_pair(args)?;
        Some(numeric_result(a - b, int))
    }
    fn reverse(&self, missing_index: usize, known: &[Option<Value>], result: &Value) -> Option<Value> {
        let r = result.as_f64()?;
        let int = matches!(result, Value::Integer(_));
        match missing_index {
            0 => Some(numeric_result(r + known[1].as_ref()?.as_f64()?, int)),
            1 => Some(numeric_result(known[0].as_ref()?.as_f64()? - r, int)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Mul;
impl ComputedFunction for Mul {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let (a, b, int) = numeric_pair(args)?;
        Some(numeric_result(a * b, int))
    }
    fn reverse(&self, missing_index: usize, known: &[Option<Value>], result: &Value) -> Option<Value> {
        let r = result.as_f64()?;
        let int = matches!(result, Value::Integer(_));
        let other = match missing_index {
            0 => known[1].as_ref()?.as_f64()?,
            1 => known[0].as_ref()?.as_f64()?,
            _ => return None,
        };
        if other == 0.0 {
            return None;
        }
        Some(numeric_result(r / other, int))
    }
}

#[derive(Debug, Default)]
pub struct Div;
impl ComputedFunction for Div {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let (a, b, int) = numeric_pair(args)?;
        if b == 0.0 {
            return None;
        }
        Some(numeric_result(a / b, int))
    }
    fn reverse(&self, missing_index: usize, known: &[Option<Value>], result: &Value) -> Option<Value> {
        let r = result.as_f64()?;
        let int = matches!(result, Value::Integer(_));
        match missing_index {
            // dividend = result * divisor
            0 => Some(numeric_result(r * known[1].as_ref()?.as_f64()?, int)),
            // divisor = dividend / result
            1 => {
                if r == 0.0 {
                    return None;
                }
                Some(numeric_result(known[0].as_ref()?.as_f64()? / r, int))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Concat;
impl ComputedFunction for Concat {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        Some(Value::String(format!("{}{}", args[0].as_str()?, args[1].as_str()?)))
    }
}

#[derive(Debug, Default)]
pub struct Length;
impl ComputedFunction for Length {
    fn arity(&self) -> usize {
        1
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        Some(Value::Integer(args[0].as_str()?.chars().count() as i64))
    }
}

#[derive(Debug, Default)]
pub struct ToUpper;
impl ComputedFunction for ToUpper {
    fn arity(&self) -> usize {
        1
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        Some(Value::String(args[0].as_str()?.to_uppercase()))
    }
}

#[derive(Debug, Default)]
pub struct ToLower;
impl ComputedFunction for ToLower {
    fn arity(&self) -> usize {
        1
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        Some(Value::String(args[0].as_str()?.to_lowercase()))
    }
}

#[derive(Debug, Default)]
pub struct ToStringFn;
impl ComputedFunction for ToStringFn {
    fn arity(&self) -> usize {
        1
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        Some(Value::String(args[0].to_string()))
    }
}

#[derive(Debug, Default)]
pub struct ParseInt;
impl ComputedFunction for ParseInt {
    fn arity(&self) -> usize {
        1
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        args[0].as_str()?.trim().parse::<i64>().ok().map(Value::Integer)
    }
}

#[derive(Debug, Default)]
pub struct ParseFloat;
impl ComputedFunction for ParseFloat {
    fn arity(&self) -> usize {
        1
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        args[0].as_str()?.trim().parse::<f64>().ok().map(Value::Float)
    }
}

#[derive(Debug, Default)]
pub struct Average;
impl ComputedFunction for Average {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let (a, b, int) = numeric_pair(args)?;
        let avg = (a + b) / 2.0;
        Some(if int && avg.fract() == 0.0 {
            Value::Integer(avg as i64)
        } else {
            Value::Float(avg)
        })
    }
    fn reverse(&self, missing_index: usize, known: &[Option<Value>], result: &Value) -> Option<Value> {
        // average(a, b) = r  =>  the missing side = 2r - other.
        let r = result.as_f64()?;
        let other = known.iter().flatten().next()?.as_f64()?;
        let int = matches!(result, Value::Integer(_)) && matches!(known.iter().flatten().next(), Some(Value::Integer(_)));
        match missing_index {
            0 | 1 => Some(numeric_result(2.0 * r - other, int)),
            _ => None,
        }
    }
}

/// Binary minimum. Not reversible: knowing the smaller of two values and
/// the result does not determine the larger one.
#[derive(Debug, Default)]
pub struct Min;
impl ComputedFunction for Min {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let (a, b, int) = numeric_pair(args)?;
        Some(numeric_result(a.min(b), int))
    }
}

/// Binary maximum. Not reversible, for the same reason as [`Min`].
#[derive(Debug, Default)]
pub struct Max;
impl ComputedFunction for Max {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let (a, b, int) = numeric_pair(args)?;
        Some(numeric_result(a.max(b), int))
    }
}

/// Median of three values. Not reversible.
#[derive(Debug, Default)]
pub struct Median;
impl ComputedFunction for Median {
    fn arity(&self) -> usize {
        3
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let a = args[0].as_f64()?;
        let b = args[1].as_f64()?;
        let c = args[2].as_f64()?;
        let int = args.iter().all(|v| matches!(v, Value::Integer(_)));
        let mut sorted = [a, b, c];
        sorted.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
        Some(numeric_result(sorted[1], int))
    }
}

/// `power(base, exponent)`. Not reversible: spec 8 invariant 11's
/// reversible family is `{sum, minus, product, divide, average}` only.
#[derive(Debug, Default)]
pub struct Power;
impl ComputedFunction for Power {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let (a, b, int) = numeric_pair(args)?;
        let r = a.powf(b);
        Some(numeric_result(r, int && b.fract() == 0.0 && b >= 0.0))
    }
}

/// `collection_size(collection)`: number of elements of a `Tuple` or `Set`.
#[derive(Debug, Default)]
pub struct CollectionSize;
impl ComputedFunction for CollectionSize {
    fn arity(&self) -> usize {
        1
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        match &args[0] {
            Value::Tuple(items) | Value::Set(items) => Some(Value::Integer(items.len() as i64)),
            _ => None,
        }
    }
}

/// `collection_contains(collection, element)`.
#[derive(Debug, Default)]
pub struct CollectionContains;
impl ComputedFunction for CollectionContains {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        match &args[0] {
            Value::Tuple(items) | Value::Set(items) => Some(Value::Boolean(items.contains(&args[1]))),
            _ => None,
        }
    }
}

/// `collection_union(set, set)`: set union, deduplicated.
#[derive(Debug, Default)]
pub struct CollectionUnion;
impl ComputedFunction for CollectionUnion {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let (Value::Set(a), Value::Set(b)) = (&args[0], &args[1]) else {
            return None;
        };
        let mut out = a.clone();
        for item in b {
            if !out.contains(item) {
                out.push(item.clone());
            }
        }
        Some(Value::Set(out))
    }
}

/// `tuple_get(tuple, index)`: positional projection out of a `Tuple`.
#[derive(Debug, Default)]
pub struct TupleGet;
impl ComputedFunction for TupleGet {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let Value::Tuple(items) = &args[0] else {
            return None;
        };
        let idx = args[1].as_i64()?;
        usize::try_from(idx).ok().and_then(|i| items.get(i)).cloned()
    }
}

/// `dict_get(dict, key)`: lookup by string key into a `Dict`.
#[derive(Debug, Default)]
pub struct DictGet;
impl ComputedFunction for DictGet {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let Value::Dict(entries) = &args[0] else {
            return None;
        };
        let key = args[1].as_str()?;
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }
}

/// `dict_contains_key(dict, key)`.
#[derive(Debug, Default)]
pub struct DictContainsKey;
impl ComputedFunction for DictContainsKey {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let Value::Dict(entries) = &args[0] else {
            return None;
        };
        let key = args[1].as_str()?;
        Some(Value::Boolean(entries.iter().any(|(k, _)| k == key)))
    }
}

/// Regex match: `regex_match(subject, pattern)`. One-way only — no
/// reverse, matching spec 4.5's note that string functions are typically
/// not invertible.
#[derive(Debug, Default)]
pub struct RegexMatch;
impl ComputedFunction for RegexMatch {
    fn arity(&self) -> usize {
        2
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let subject = args[0].as_str()?;
        let pattern = args[1].as_str()?;
        let re = regex::Regex::new(pattern).ok()?;
        Some(Value::Boolean(re.is_match(subject)))
    }
}

/// `regex_replace(subject, pattern, replacement)`.
#[derive(Debug, Default)]
pub struct RegexReplace;
impl ComputedFunction for RegexReplace {
    fn arity(&self) -> usize {
        3
    }
    fn forward(&self, args: &[Value]) -> Option<Value> {
        let subject = args[0].as_str()?;
        let pattern = args[1].as_str()?;
        let replacement = args[2].as_str()?;
        let re = regex::Regex::new(pattern).ok()?;
        Some(Value::String(re.replace_all(subject, replacement).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_reverses_to_recover_either_argument() {
        // spec 8, invariant 11
        let add = Add;
        let sum = add.forward(&[Value::Integer(2), Value::Integer(3)]).unwrap();
        assert_eq!(sum, Value::Integer(5));
        let recovered = add.reverse(1, &[Some(Value::Integer(2)), None], &sum).unwrap();
        assert_eq!(recovered, Value::Integer(3));
    }

    #[test]
    fn div_reverse_rejects_zero_result_for_divisor_recovery() {
        let div = Div;
        let recovered = div.reverse(1, &[Some(Value::Integer(10)), None], &Value::Integer(0));
        assert!(recovered.is_none());
    }

    #[test]
    fn mul_round_trips_through_forward_and_reverse() {
        let mul = Mul;
        let product = mul.forward(&[Value::Integer(6), Value::Integer(7)]).unwrap();
        let recovered = mul.reverse(0, &[None, Some(Value::Integer(7))], &product).unwrap();
        assert_eq!(recovered, Value::Integer(6));
    }

    #[test]
    fn average_reverses_to_recover_either_side() {
        // spec 8, invariant 11
        let avg = Average;
        let result = avg.forward(&[Value::Integer(4), Value::Integer(10)]).unwrap();
        assert_eq!(result, Value::Integer(7));
        let recovered = avg.reverse(1, &[Some(Value::Integer(4)), None], &result).unwrap();
        assert_eq!(recovered, Value::Integer(10));
    }

    #[test]
    fn min_and_max_pick_the_right_side() {
        let args = [Value::Integer(3), Value::Integer(9)];
        assert_eq!(Min.forward(&args), Some(Value::Integer(3)));
        assert_eq!(Max.forward(&args), Some(Value::Integer(9)));
    }

    #[test]
    fn median_of_three_sorts_and_picks_the_middle() {
        let args = [Value::Integer(5), Value::Integer(1), Value::Integer(3)];
        assert_eq!(Median.forward(&args), Some(Value::Integer(3)));
    }

    #[test]
    fn power_computes_integer_exponentiation() {
        let args = [Value::Integer(2), Value::Integer(10)];
        assert_eq!(Power.forward(&args), Some(Value::Integer(1024)));
    }

    #[test]
    fn collection_size_and_contains_over_a_set() {
        let set = Value::Set(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(CollectionSize.forward(&[set.clone()]), Some(Value::Integer(2)));
        assert_eq!(
            CollectionContains.forward(&[set, Value::Integer(2)]),
            Some(Value::Boolean(true))
        );
    }

    #[test]
    fn collection_union_deduplicates() {
        let a = Value::Set(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::Set(vec![Value::Integer(2), Value::Integer(3)]);
        let union = CollectionUnion.forward(&[a, b]).unwrap();
        match union {
            Value::Set(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected a set"),
        }
    }

    #[test]
    fn tuple_get_projects_by_position() {
        let tuple = Value::Tuple(vec![Value::Integer(10), Value::Integer(20)]);
        assert_eq!(TupleGet.forward(&[tuple, Value::Integer(1)]), Some(Value::Integer(20)));
    }

    #[test]
    fn dict_get_and_contains_key() {
        let dict = Value::Dict(vec![("a".to_string(), Value::Integer(1))]);
        assert_eq!(
            DictGet.forward(&[dict.clone(), Value::String("a".to_string())]),
            Some(Value::Integer(1))
        );
        assert_eq!(
            DictContainsKey.forward(&[dict, Value::String("b".to_string())]),
            Some(Value::Boolean(false))
        );
    }

    #[test]
    fn regex_match_is_one_way_only() {
        let m = RegexMatch;
        assert_eq!(
            m.forward(&[Value::String("hello".into()), Value::String("^h".into())]),
            Some(Value::Boolean(true))
        );
        assert!(m.reverse(0, &[], &Value::Boolean(true)).is_none());
    }
}
