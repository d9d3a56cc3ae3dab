//! Interning factories and the term algebra (spec 3, 4.1).
//!
//! Terms are tagged variants over small interned ids, never pointer
//! graphs (spec 9, "Cyclic data"): a `Variable`/`Constant`/`Literal` is a
//! newtype around a `u32` handed out by an [`Interner`]. Equality is id
//! equality; the `Interner` guarantees two calls with the same payload
//! return the same handle (spec 8, invariant 3).
//!
//! The `Interner` is owned by a session (spec 9, "Global mutable state")
//! — never a process-wide singleton. It is thread-safe: its tables sit
//! behind a single `parking_lot::Mutex`, so every method takes `&self`
//! and a session can be shared (e.g. `Arc<Interner>`) across the
//! multi-threaded chase applier (spec 4.10 step 5) or a computed-predicate
//! source that needs to intern new literal results mid-query. Cloning a
//! `Term` is cheap (ids plus, for function terms, a `Vec<Term>` of
//! interned ids).

use crate::value::{DataType, Value};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;

macro_rules! interned_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);
    };
}

interned_id!(VariableId);
interned_id!(ConstantId);
interned_id!(LiteralId);
interned_id!(PredicateId);
interned_id!(FunctionId);

/// A free-variable name. Two variables are equal iff their interned ids
/// match (spec 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub VariableId);

/// An uninterpreted symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Constant(pub ConstantId);

/// A typed primitive literal handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(pub LiteralId);

/// `{name, arity}`, interned; equality by `(name, arity)` (spec 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Predicate(pub PredicateId);

/// A function symbol used by [`Term::LogicalFunctionTerm`] /
/// [`Term::EvaluableFunctionTerm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionSymbol(pub FunctionId);

/// A term, per spec 3.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Variable(Variable),
    Constant(Constant),
    Literal(Literal),
    /// An uninterpreted function term, opaque to evaluation.
    LogicalFunctionTerm(FunctionSymbol, Vec<Term>),
    /// A function term whose function is registered in the computed-function
    /// registry; rewritten away at query-preparation time (spec 4.4 step 2).
    EvaluableFunctionTerm(FunctionSymbol, Vec<Term>),
}

impl Term {
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_ground(&self) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::Constant(_) | Term::Literal(_) => true,
            Term::LogicalFunctionTerm(_, args) | Term::EvaluableFunctionTerm(_, args) => {
                args.iter().all(Term::is_ground)
            }
        }
    }

    /// Free variables of this term, in first-occurrence order.
    pub fn free_variables(&self) -> Vec<Variable> {
        let mut out = Vec::new();
        self.collect_free_variables(&mut out);
        out
    }

    fn collect_free_variables(&self, out: &mut Vec<Variable>) {
        match self {
            Term::Variable(v) => {
                if !out.contains(v) {
                    out.push(*v);
                }
            }
            Term::Constant(_) | Term::Literal(_) => {}
            Term::LogicalFunctionTerm(_, args) | Term::EvaluableFunctionTerm(_, args) => {
                for arg in args {
                    arg.collect_free_variables(out);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    variable_names: Vec<String>,
    variable_lookup: HashMap<String, VariableId>,

    constant_names: Vec<String>,
    constant_lookup: HashMap<String, ConstantId>,

    literals: Vec<(Value, DataType)>,
    literal_lookup: HashMap<(Value, DataType), LiteralId>,

    predicates: Vec<(String, usize)>,
    predicate_lookup: HashMap<(String, usize), PredicateId>,

    function_names: Vec<String>,
    function_lookup: HashMap<String, FunctionId>,

    fresh_counter: u32,
}

/// Per-session interning factory (spec 4.1, spec 9 "Global mutable state").
#[derive(Debug, Default)]
pub struct Interner {
    tables: Mutex<Tables>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_variable(&self, name: &str) -> Variable {
        let mut t = self.tables.lock();
        if let Some(id) = t.variable_lookup.get(name) {
            return Variable(*id);
        }
        let id = VariableId(t.variable_names.len() as u32);
        t.variable_names.push(name.to_string());
        t.variable_lookup.insert(name.to_string(), id);
        Variable(id)
    }

    pub fn intern_constant(&self, name: &str) -> Constant {
        let mut t = self.tables.lock();
        if let Some(id) = t.constant_lookup.get(name) {
            return Constant(*id);
        }
        let id = ConstantId(t.constant_names.len() as u32);
        t.constant_names.push(name.to_string());
        t.constant_lookup.insert(name.to_string(), id);
        Constant(id)
    }

    pub fn intern_literal(&self, value: Value, datatype: DataType) -> Literal {
        let mut t = self.tables.lock();
        let key = (value.clone(), datatype);
        if let Some(id) = t.literal_lookup.get(&key) {
            return Literal(*id);
        }
        let id = LiteralId(t.literals.len() as u32);
        t.literals.push((value, datatype));
        t.literal_lookup.insert(key, id);
        Literal(id)
    }

    pub fn intern_predicate(&self, name: &str, arity: usize) -> Predicate {
        let mut t = self.tables.lock();
        let key = (name.to_string(), arity);
        if let Some(id) = t.predicate_lookup.get(&key) {
            return Predicate(*id);
        }
        let id = PredicateId(t.predicates.len() as u32);
        t.predicates.push((name.to_string(), arity));
        t.predicate_lookup.insert(key, id);
        Predicate(id)
    }

    pub fn intern_function(&self, name: &str) -> FunctionSymbol {
        let mut t = self.tables.lock();
        if let Some(id) = t.function_lookup.get(name) {
            return FunctionSymbol(*id);
        }
        let id = FunctionId(t.function_names.len() as u32);
        t.function_names.push(name.to_string());
        t.function_lookup.insert(name.to_string(), id);
        FunctionSymbol(id)
    }

    /// Produce a variable not present under any name interned so far
    /// (spec 4.1, `fresh`). Always allocates a new slot — it never dedups
    /// against an existing name, which is what makes it "fresh".
    pub fn fresh(&self, hint: &str) -> Variable {
        loop {
            let candidate = {
                let mut t = self.tables.lock();
                t.fresh_counter += 1;
                format!("_{hint}${}", t.fresh_counter)
            };
            let mut t = self.tables.lock();
            if !t.variable_lookup.contains_key(&candidate) {
                let id = VariableId(t.variable_names.len() as u32);
                t.variable_names.push(candidate.clone());
                t.variable_lookup.insert(candidate, id);
                return Variable(id);
            }
        }
    }

    /// Produce a constant with reference semantics: never deduped against
    /// an existing constant of the same name, even if one exists (spec 9,
    /// "a 'value term' and an 'identity term' differ by whether the
    /// interner deduplicates equal payloads").
    pub fn intern_identity_constant(&self, name_hint: &str) -> Constant {
        let mut t = self.tables.lock();
        t.fresh_counter += 1;
        let id = ConstantId(t.constant_names.len() as u32);
        let unique_name = format!("{name_hint}#{}", t.fresh_counter);
        t.constant_names.push(unique_name);
        Constant(id)
    }

    pub fn variable_name(&self, v: Variable) -> String {
        self.tables.lock().variable_names[v.0 .0 as usize].clone()
    }

    pub fn constant_name(&self, c: Constant) -> String {
        self.tables.lock().constant_names[c.0 .0 as usize].clone()
    }

    pub fn literal_value(&self, l: Literal) -> (Value, DataType) {
        self.tables.lock().literals[l.0 .0 as usize].clone()
    }

    pub fn predicate_info(&self, p: Predicate) -> (String, usize) {
        self.tables.lock().predicates[p.0 .0 as usize].clone()
    }

    pub fn predicate_name(&self, p: Predicate) -> String {
        self.predicate_info(p).0
    }

    pub fn predicate_arity(&self, p: Predicate) -> usize {
        self.predicate_info(p).1
    }

    pub fn function_name(&self, f: FunctionSymbol) -> String {
        self.tables.lock().function_names[f.0 .0 as usize].clone()
    }

    /// Reserved predicates used to represent `Equality`/`Comparison`
    /// formulas as atoms (spec 3). Interned lazily, same lookup path as
    /// any other predicate — there is nothing magic about them beyond the
    /// evaluator routing them to `crate::computed`.
    pub fn reserved_equality_predicate(&self) -> Predicate {
        self.intern_predicate("=", 2)
    }

    pub fn reserved_comparison_predicate(&self, op: ComparisonOp) -> Predicate {
        self.intern_predicate(op.reserved_name(), 2)
    }

    /// The predicate standing in for "result = f(args...)" once an
    /// `EvaluableFunctionTerm` is rewritten out of an atom's argument list
    /// at query-preparation time (spec 4.4 step 2). Arity is the
    /// function's arity plus one (the trailing result position); the
    /// computed-function registry (`crate::computed`) evaluates it.
    pub fn reserved_function_predicate(&self, f: FunctionSymbol, arity: usize) -> Predicate {
        let name = format!("__eval_{}", self.function_name(f));
        self.intern_predicate(&name, arity + 1)
    }
}

/// Comparison operators for `Formula::Comparison` (spec 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Lt,
    Gt,
    Le,
    Ge,
    Ne,
}

impl ComparisonOp {
    fn reserved_name(self) -> &'static str {
        match self {
            ComparisonOp::Lt => "__lt__",
            ComparisonOp::Gt => "__gt__",
            ComparisonOp::Le => "__le__",
            ComparisonOp::Ge => "__ge__",
            ComparisonOp::Ne => "__ne__",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sym = match self {
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Ne => "!=",
        };
        write!(f, "{sym}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent_within_a_session() {
        let it = Interner::new();
        let a = it.intern_constant("alice");
        let b = it.intern_constant("alice");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_names_get_distinct_handles() {
        let it = Interner::new();
        let a = it.intern_constant("alice");
        let b = it.intern_constant("bob");
        assert_ne!(a, b);
    }

    #[test]
    fn predicate_equality_is_name_and_arity() {
        let it = Interner::new();
        let p2 = it.intern_predicate("edge", 2);
        let p3 = it.intern_predicate("edge", 3);
        let p2_again = it.intern_predicate("edge", 2);
        assert_ne!(p2, p3);
        assert_eq!(p2, p2_again);
    }

    #[test]
    fn fresh_variables_are_always_distinct() {
        let it = Interner::new();
        let a = it.fresh("x");
        let b = it.fresh("x");
        assert_ne!(a, b);
    }

    #[test]
    fn literal_interning_dedups_equal_payloads() {
        let it = Interner::new();
        let a = it.intern_literal(Value::Integer(3), DataType::Integer);
        let b = it.intern_literal(Value::Integer(3), DataType::Integer);
        assert_eq!(a, b);
    }

    #[test]
    fn identity_constants_never_dedup() {
        let it = Interner::new();
        let a = it.intern_identity_constant("anon");
        let b = it.intern_identity_constant("anon");
        assert_ne!(a, b);
    }

    #[test]
    fn ground_term_has_no_free_variables() {
        let it = Interner::new();
        let c = Term::Constant(it.intern_constant("a"));
        assert!(c.is_ground());
        assert!(c.free_variables().is_empty());
    }

    #[test]
    fn function_term_collects_nested_free_variables() {
        let it = Interner::new();
        let f = it.intern_function("sum");
        let x = Term::Variable(it.intern_variable("X"));
        let y = Term::Variable(it.intern_variable("Y"));
        let term = Term::EvaluableFunctionTerm(f, vec![x.clone(), y.clone(), x]);
        let free = term.free_variables();
        assert_eq!(free.len(), 2);
    }
}
