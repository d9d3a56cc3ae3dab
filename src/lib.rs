//! # Existential-Rule (Datalog±) Reasoning Core
//!
//! A prototyping engine for existential, possibly disjunctive Datalog±
//! rules: term/atom/substitution algebra, homomorphism-based
//! conjunctive-query search, a first-order query evaluator stack,
//! piece-unifier-driven UCQ rewriting, a Graph of Rule Dependencies with
//! several stratification strategies, and a pluggable forward chase.
//!
//! ## Pipeline
//!
//! ```text
//! Rule/FOQuery (term.rs, formula.rs, rule.rs, query.rs)
//!     ↓
//! FO evaluator (evaluator/)         -- direct query answering
//!     ↓
//! UCQ rewriting (rewriting/)        -- backward chaining over existentials/disjunction
//!
//! Rule set
//!     ↓
//! GRD + stratification (grd/)
//!     ↓
//! Chase (chase/)                    -- forward saturation, stratum by stratum
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use existential_core::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! let p = engine.interner().intern_predicate("edge", 2);
//! // ... build rules and facts, then:
//! let result = engine.chase()?;
//! ```

pub mod atom;
pub mod chase;
pub mod computed;
pub mod config;
pub mod data_source;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod fact_base;
pub mod formula;
pub mod grd;
pub mod homomorphism;
pub mod partition;
pub mod query;
pub mod rewriting;
pub mod rule;
pub mod substitution;
pub mod term;
pub mod unifier;
pub mod value;

pub use config::EngineConfig;
pub use error::{EngineError, HaltReason, Result};
pub use fact_base::FactBase;
pub use query::FOQuery;
pub use rule::Rule;
pub use term::Interner;

use chase::ChaseResult;
use computed::ComputedSource;
use diagnostics::Diagnostics;
use evaluator::{PreparedQuery, SourceRegistry};
use homomorphism::StaticScheduler;
use term::Term;

/// A session: one interner, rule set, and fact base, with the
/// configuration that picks default chase/GRD/search strategies.
///
/// Mirrors the teacher's `DatalogEngine` as the crate's single entry
/// point, but owns the new term/rule/fact-base triple instead of an
/// AST/IR pipeline.
pub struct Engine {
    interner: Interner,
    rules: Vec<Rule>,
    facts: FactBase,
    diagnostics: Diagnostics,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            interner: Interner::new(),
            rules: Vec::new(),
            facts: FactBase::new("facts"),
            diagnostics: Diagnostics::new(),
            config,
        }
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn facts(&self) -> &FactBase {
        &self.facts
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn add_fact(&mut self, predicate: term::Predicate, args: Vec<Term>) -> bool {
        self.facts.add(predicate, args)
    }

    /// Answer a first-order query directly against the current facts and
    /// the standard computed-predicate library (spec 4.4, 4.5), without
    /// consulting the rule set.
    pub fn query(&self, query: &FOQuery) -> Result<Vec<Vec<Term>>> {
        let prepared = PreparedQuery::prepare(query, &self.interner);
        let computed = ComputedSource::new(&self.interner);
        let mut registry = SourceRegistry::new();
        for predicate in self.facts.predicates() {
            registry.register(*predicate, &self.facts);
        }
        for predicate in computed.predicates() {
            registry.register(predicate, &computed);
        }
        prepared.run(&registry, &self.interner, &StaticScheduler, &self.diagnostics)
    }

    /// Saturate the current fact base under the rule set using this
    /// engine's configured chase strategies, stratified by the GRD
    /// (spec 4.9, 4.10).
    pub fn chase(&mut self) -> Result<ChaseResult> {
        let chase_config = chase::ChaseConfig {
            scheduler: self.config.chase.scheduler,
            trigger_computer: self.config.chase.trigger_computer,
            checker: self.config.chase.checker.clone(),
            renamer: self.config.chase.renamer,
            applier: self.config.chase.applier,
            grd_mode: self.config.grd.mode,
            stratification: self.config.grd.stratification,
            lineage: chase::LineagePolicy::None,
            halt: chase::HaltConfig {
                step_limit: self.config.chase.step_limit,
                atom_limit: self.config.chase.atom_limit,
                timeout: None,
            },
        };
        let facts = std::mem::replace(&mut self.facts, FactBase::new("facts"));
        let result = chase::run_stratified_chase(&chase_config, &self.rules, facts, &self.interner)?;
        self.facts = FactBase::from_atoms("facts", result.facts.all_atoms().map(|(p, a)| (p, a.clone())));
        Ok(result)
    }
}
