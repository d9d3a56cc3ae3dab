//! The chase (spec 4.10): forward saturation of a fact base under a rule
//! set, staged as scheduling, trigger computation, trigger checking,
//! existential renaming, rule application, and halting — each stage
//! pluggable per spec's named strategy variants.

mod applier;
mod checker;
mod engine;
mod halting;
mod lineage;
mod renamer;
mod scheduler;
mod trigger;

pub use applier::{render_trigger, ApplierStrategy};
pub use checker::{CheckerKind, CheckerState};
pub use engine::{run_chase, run_stratified_chase, ChaseConfig, ChaseResult};
pub use halting::{HaltConfig, HaltState};
pub use lineage::{LineagePolicy, LineageTracker, Provenance};
pub use renamer::{rename_existentials, RenamerStrategy};
pub use scheduler::{schedule, SchedulerStrategy};
pub use trigger::{compute_triggers, Trigger, TriggerComputer};
