//! First-order queries (spec 3).

use crate::formula::Formula;
use crate::term::{Interner, Variable};
use std::collections::HashSet;

/// `{answer_vars, body}`. `answer_vars` is ordered as written; every
/// answer variable must be free in `body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FOQuery {
    pub answer_vars: Vec<Variable>,
    pub body: Formula,
}

impl FOQuery {
    /// Build a query, checking that every answer variable is free in the
    /// body (spec 3 invariant).
    pub fn new(answer_vars: Vec<Variable>, body: Formula) -> Result<Self, String> {
        let free: HashSet<Variable> = body.free_variables().into_iter().collect();
        for v in &answer_vars {
            if !free.contains(v) {
                return Err(format!(
                    "answer variable is not free in the query body: {v:?}"
                ));
            }
        }
        Ok(FOQuery { answer_vars, body })
    }

    /// A wildcard projection: every free variable of `body`, in a
    /// deterministic order by interned variable id (spec 3).
    pub fn wildcard(body: Formula) -> Self {
        let mut answer_vars = body.free_variables();
        answer_vars.sort_by_key(|v| v.0 .0);
        FOQuery { answer_vars, body }
    }

    /// A boolean (zero-arity) query: `?() :- body`.
    pub fn boolean(body: Formula) -> Self {
        FOQuery {
            answer_vars: Vec::new(),
            body,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.answer_vars.is_empty()
    }

    pub fn describe(&self, interner: &Interner) -> String {
        let vars: Vec<_> = self
            .answer_vars
            .iter()
            .map(|v| interner.variable_name(*v).to_string())
            .collect();
        format!("?({})", vars.join(", "))
    }
}
