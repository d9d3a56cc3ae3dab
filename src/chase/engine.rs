//! Chase orchestration (spec 4.10): the per-step lifecycle (schedule,
//! compute triggers, check, rename, apply, halt) and the stratified chase
//! that runs one sub-chase per GRD stratum.

use super::applier::{apply_breadth_first, apply_multi_thread, apply_parallel, ApplierStrategy};
use super::checker::{CheckerKind, CheckerState};
use super::halting::{HaltConfig, HaltState};
use super::lineage::{LineagePolicy, LineageTracker};
use super::renamer::{rename_existentials, RenamerStrategy};
use super::scheduler::{schedule, SchedulerStrategy};
use super::trigger::{compute_triggers, Trigger, TriggerComputer};
use crate::error::{EngineError, HaltReason};
use crate::fact_base::{FactBase, GroundAtom};
use crate::grd::{self, Grd, GrdMode, StratificationStrategy};
use crate::rule::Rule;
use crate::substitution::Substitution;
use crate::term::{Interner, Predicate};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ChaseConfig {
    pub scheduler: SchedulerStrategy,
    pub trigger_computer: TriggerComputer,
    pub checker: CheckerKind,
    pub renamer: RenamerStrategy,
    pub applier: ApplierStrategy,
    pub grd_mode: GrdMode,
    pub stratification: StratificationStrategy,
    pub lineage: LineagePolicy,
    pub halt: HaltConfig,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerStrategy::Naive,
            trigger_computer: TriggerComputer::Naive,
            checker: CheckerKind::SemiOblivious,
            renamer: RenamerStrategy::FrontierSkolem,
            applier: ApplierStrategy::BreadthFirst,
            grd_mode: GrdMode::Predicate,
            stratification: StratificationStrategy::ByScc,
            lineage: LineagePolicy::None,
            halt: HaltConfig::default(),
        }
    }
}

pub struct ChaseResult {
    pub facts: FactBase,
    pub halt_reason: HaltReason,
    pub steps: u64,
    pub lineage: LineageTracker,
}

struct StepOutcome {
    added: Vec<GroundAtom>,
    touched_rules: HashSet<usize>,
}

fn rule_ids_subset<'a>(rules: &'a [Rule], indices: &[usize]) -> Vec<(&'a Rule, usize)> {
    indices.iter().map(|&i| (&rules[i], i)).collect()
}

fn step(
    config: &ChaseConfig,
    rules: &[Rule],
    grd: Option<&Grd>,
    facts: &mut FactBase,
    checker_state: &mut CheckerState,
    lineage: &mut LineageTracker,
    interner: &Interner,
    touched_predicates: &HashSet<Predicate>,
    touched_rules: &HashSet<usize>,
    delta: &HashSet<GroundAtom>,
    delta_facts: &FactBase,
) -> Result<StepOutcome, EngineError> {
    let scheduled = schedule(config.scheduler, rules, touched_predicates, touched_rules, grd);

    let mut to_apply: Vec<(&Rule, Substitution)> = Vec::new();
    let mut fired: Vec<usize> = Vec::new();
    let mut fired_rules: HashSet<usize> = HashSet::new();

    for (rule, rule_index) in rule_ids_subset(rules, &scheduled) {
        let triggers: Vec<Trigger> = compute_triggers(
            config.trigger_computer,
            rule,
            rule_index,
            facts,
            delta,
            delta_facts,
            interner,
        )?;
        for trigger in triggers {
            if !checker_state.should_fire(config.checker.clone(), rule, rule_index, &trigger.substitution) {
                continue;
            }
            let existential_subst = rename_existentials(rule, rule_index, &trigger.substitution, config.renamer, interner);
            let full_subst = trigger.substitution.compose(&existential_subst);
            fired_rules.insert(rule_index);
            fired.push(rule_index);
            to_apply.push((rule, full_subst));
        }
    }

    for (rule_index, (rule, subst)) in fired.iter().zip(&to_apply) {
        for atom in super::applier::render_trigger(rule, subst) {
            lineage.record(atom, *rule_index, subst);
        }
    }

    let added = match config.applier {
        ApplierStrategy::BreadthFirst => apply_breadth_first(facts, &to_apply),
        ApplierStrategy::Parallel => apply_parallel(facts, &to_apply),
        ApplierStrategy::MultiThread => {
            let mutex = Mutex::new(std::mem::replace(facts, FactBase::new("facts")));
            let added = apply_multi_thread(&mutex, &to_apply);
            *facts = mutex.into_inner();
            added
        }
        ApplierStrategy::SourceDelegated => Vec::new(),
    };

    Ok(StepOutcome { added, touched_rules: fired_rules })
}

/// Run the (non-stratified) chase to completion or a halting condition.
pub fn run_chase(config: &ChaseConfig, rules: &[Rule], mut facts: FactBase, interner: &Interner) -> Result<ChaseResult, EngineError> {
    let grd = match config.scheduler {
        SchedulerStrategy::Grd => Some(grd::build(rules, config.grd_mode)),
        _ => None,
    };
    let mut checker_state = CheckerState::new();
    let mut lineage = LineageTracker::new(config.lineage);
    let halt_state = HaltState::new(config.halt.clone(), Instant::now());

    let mut touched_predicates: HashSet<Predicate> = HashSet::new();
    let mut touched_rules: HashSet<usize> = HashSet::new();
    let mut steps: u64 = 0;
    let mut delta: HashSet<GroundAtom> = facts.all_atoms().map(|(p, a)| (p, a.clone())).collect();
    let mut delta_facts = FactBase::from_atoms("delta", delta.iter().cloned());

    loop {
        let outcome = step(
            config,
            rules,
            grd.as_ref(),
            &mut facts,
            &mut checker_state,
            &mut lineage,
            interner,
            &touched_predicates,
            &touched_rules,
            &delta,
            &delta_facts,
        )?;

        steps += 1;
        tracing::debug!(
            step = steps,
            rules_fired = outcome.touched_rules.len(),
            facts_added = outcome.added.len(),
            facts_total = facts.len(),
            "chase step"
        );
        let rules_remaining = schedule(config.scheduler, rules, &touched_predicates, &outcome.touched_rules, grd.as_ref()).len();

        if let Some(reason) = halt_state.check(steps, facts.len(), outcome.added.len(), rules_remaining) {
            tracing::debug!(?reason, steps, "chase halted");
            return Ok(ChaseResult { facts, halt_reason: reason, steps, lineage });
        }

        touched_predicates = outcome.added.iter().map(|(p, _)| *p).collect();
        touched_rules = outcome.touched_rules;
        delta = outcome.added.iter().cloned().collect();
        delta_facts = FactBase::from_atoms("delta", delta.iter().cloned());
    }
}

/// Stratified chase: build the GRD and a stratification, then run a
/// sub-chase per stratum in order, each starting from the previous
/// stratum's saturated fact base (spec 4.9).
pub fn run_stratified_chase(
    config: &ChaseConfig,
    rules: &[Rule],
    facts: FactBase,
    interner: &Interner,
) -> Result<ChaseResult, EngineError> {
    let g = grd::build(rules, config.grd_mode);
    let strata = grd::stratify(rules, &g, config.stratification)?;

    let mut current_facts = facts;
    let mut total_steps = 0u64;
    let mut lineage = LineageTracker::new(config.lineage);
    let mut last_reason = HaltReason::RulesToApplyEmpty;

    for (stratum_index, stratum) in strata.iter().enumerate() {
        let stratum_rules: Vec<Rule> = stratum.rule_indices.iter().map(|&i| rules[i].clone()).collect();
        if stratum_rules.is_empty() {
            continue;
        }
        tracing::debug!(stratum = stratum_index, rules = stratum_rules.len(), "stratum start");
        let result = run_chase(config, &stratum_rules, current_facts, interner)?;
        current_facts = result.facts;
        total_steps += result.steps;
        last_reason = result.halt_reason;
    }

    Ok(ChaseResult { facts: current_facts, halt_reason: last_reason, steps: total_steps, lineage })
}
