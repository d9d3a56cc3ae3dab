//! Typed literal payloads.
//!
//! Grounded on the teacher's `value::Value` enum (same variant-naming
//! style: `Int64`, `Float64`, `String`, `Bool`), narrowed to the closed set
//! spec 3 names for `Literal`: integer, float, string, boolean, IRI, tuple,
//! set, dict. Collections compare structurally, matching spec's
//! "Literals of collection type ... compare structurally" invariant.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The datatype tag carried alongside a `Value` inside a `Literal` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    String,
    Boolean,
    Iri,
    Tuple,
    Set,
    Dict,
}

/// A typed primitive value.
///
/// `Eq`/`Hash` are implemented by hand because `Float` wraps an `f64`;
/// equality and hashing treat it bitwise (matching the teacher's
/// `Value::Float64` precedent of normalizing NaN out of scope for a
/// Datalog engine — floats in fact positions are expected to be concrete
/// measurements, not computed results that alias NaN).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Iri(String),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(String, Value)>),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::String(_) => DataType::String,
            Value::Boolean(_) => DataType::Boolean,
            Value::Iri(_) => DataType::Iri,
            Value::Tuple(_) => DataType::Tuple,
            Value::Set(_) => DataType::Set,
            Value::Dict(_) => DataType::Dict,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Iri(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric values compare by value across Integer/Float; everything
    /// else falls back to structural equality. Used by the comparison
    /// computed source (spec 4.5) and by `Comparison` formulas (spec 3).
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) | (Value::Iri(a), Value::Iri(b)) => {
                Some(a.cmp(b))
            }
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Iri(a), Value::Iri(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) | (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) | Value::Iri(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Tuple(v) | Value::Set(v) => v.hash(state),
            Value::Dict(entries) => entries.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Iri(iri) => write!(f, "<{iri}>"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Value::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
