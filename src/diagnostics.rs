//! Session diagnostics channel.
//!
//! `UnsafeNegationWarning` / `UnsafeUniversalWarning` (spec 7) are not
//! fatal, but callers still need to see them. Rather than print-and-forget
//! like the teacher's `DATALOG_DEBUG` env-gated `eprintln!`s, warnings are
//! both logged via `tracing::warn!` and collected on a per-session sink so
//! tests and callers can assert on them.

use parking_lot::Mutex;
use std::sync::Arc;

/// A single diagnostic raised during preparation or execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A negated formula still has free variables unbound by the
    /// enclosing substitution when it is evaluated.
    UnsafeNegation { formula_summary: String },
    /// A universally quantified formula is evaluated over a domain that
    /// cannot be proven finite.
    UnsafeUniversal { formula_summary: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnsafeNegation { formula_summary } => {
                write!(f, "unsafe negation over `{formula_summary}`")
            }
            Diagnostic::UnsafeUniversal { formula_summary } => {
                write!(f, "unsafe universal quantification over `{formula_summary}`")
            }
        }
    }
}

/// Collects diagnostics for one evaluation session. Cheaply cloneable
/// (shared `Arc<Mutex<..>>`), so a `PreparedQuery` and the evaluator that
/// executes it can both hold a handle.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    inner: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        tracing::warn!(%diagnostic, "diagnostic raised");
        self.inner.lock().push(diagnostic);
    }

    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.inner.lock())
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.inner.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_and_drains() {
        let d = Diagnostics::new();
        assert!(d.is_empty());
        d.emit(Diagnostic::UnsafeNegation {
            formula_summary: "p(X)".into(),
        });
        assert_eq!(d.snapshot().len(), 1);
        let drained = d.drain();
        assert_eq!(drained.len(), 1);
        assert!(d.is_empty());
    }

    #[test]
    fn shared_handle_sees_emits_from_clone() {
        let d = Diagnostics::new();
        let d2 = d.clone();
        d2.emit(Diagnostic::UnsafeUniversal {
            formula_summary: "q(X)".into(),
        });
        assert_eq!(d.snapshot().len(), 1);
    }
}
