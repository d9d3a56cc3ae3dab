//! Halting conditions (spec 4.10 step 7). Each condition is checked once
//! per step; the first to trip wins.

use crate::error::HaltReason;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct HaltConfig {
    pub step_limit: Option<u64>,
    pub atom_limit: Option<usize>,
    pub timeout: Option<Duration>,
}

pub struct HaltState {
    config: HaltConfig,
    started_at: Instant,
    interrupted: bool,
}

impl HaltState {
    pub fn new(config: HaltConfig, started_at: Instant) -> Self {
        Self { config, started_at, interrupted: false }
    }

    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    /// Check halting conditions after a step that created `new_atom_count`
    /// atoms (since the previous step) out of `total_atom_count` facts
    /// overall, having just completed step number `step` and scheduled
    /// `rules_remaining` rules for the next step.
    pub fn check(
        &self,
        step: u64,
        total_atom_count: usize,
        new_atom_count: usize,
        rules_remaining: usize,
    ) -> Option<HaltReason> {
        if self.interrupted {
            return Some(HaltReason::Interrupted);
        }
        if let Some(limit) = self.config.step_limit {
            if step >= limit {
                return Some(HaltReason::StepLimit(limit));
            }
        }
        if let Some(limit) = self.config.atom_limit {
            if total_atom_count >= limit {
                return Some(HaltReason::AtomLimit(limit));
            }
        }
        if let Some(timeout) = self.config.timeout {
            if self.started_at.elapsed() >= timeout {
                return Some(HaltReason::Timeout);
            }
        }
        if new_atom_count == 0 {
            return Some(HaltReason::NoNewFacts);
        }
        if rules_remaining == 0 {
            return Some(HaltReason::RulesToApplyEmpty);
        }
        None
    }
}
