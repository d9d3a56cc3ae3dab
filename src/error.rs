//! Engine error taxonomy.
//!
//! Mirrors the storage-engine error pattern: one flat `thiserror` enum per
//! crate boundary, a `Result` alias, and `#[from]` conversions where a lower
//! layer already returns something typed. `UnifierConflict` deliberately
//! does not appear here (spec 7) — it is confined to unifier enumeration
//! and modeled as an `Option`/early-return inside `crate::unifier`.

use thiserror::Error;

/// Errors that can escape the core to a caller.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed AST or an unknown predicate prefix.
    #[error("parse error: {0}")]
    Parse(String),

    /// A rule, query, or formula fails a fragment validator (safety,
    /// frontier containment, disjunct arity mismatch, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A construct recognized by the data model but not implemented by
    /// this evaluator (e.g. a pattern predicate, a subquery formula).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A data source's `evaluate` call failed; the source's identity is
    /// kept so the caller can tell which backend misbehaved.
    #[error("evaluation error in data source '{source_name}': {message}")]
    Evaluation {
        source_name: String,
        message: String,
    },

    /// `stratify` found a negative cycle in the GRD.
    #[error("stratification error: negative cycle through rule(s) {0:?}")]
    Stratification(Vec<String>),

    /// Configuration failed to load or validate.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Generic I/O failure (used by the cancellation/timeout plumbing,
    /// not by any persistence layer — the core owns none).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fallible engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// A halting reason for the chase (spec 4.10 step 7). Not an error: the
/// chase returns this alongside the saturated fact base on normal
/// termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    StepLimit(u64),
    AtomLimit(usize),
    Timeout,
    Interrupted,
    NoNewFacts,
    RulesToApplyEmpty,
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::StepLimit(n) => write!(f, "step limit reached ({n} steps)"),
            HaltReason::AtomLimit(n) => write!(f, "atom limit reached ({n} atoms)"),
            HaltReason::Timeout => write!(f, "timeout elapsed"),
            HaltReason::Interrupted => write!(f, "interrupted"),
            HaltReason::NoNewFacts => write!(f, "no facts created in previous step"),
            HaltReason::RulesToApplyEmpty => write!(f, "no rules left to apply"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halt_reason_display_is_human_readable() {
        assert_eq!(
            HaltReason::StepLimit(3).to_string(),
            "step limit reached (3 steps)"
        );
        assert_eq!(HaltReason::NoNewFacts.to_string(), "no facts created in previous step");
    }

    #[test]
    fn evaluation_error_carries_source_identity() {
        let e = EngineError::Evaluation {
            source_name: "facts".into(),
            message: "boom".into(),
        };
        assert!(e.to_string().contains("facts"));
        assert!(e.to_string().contains("boom"));
    }
}
