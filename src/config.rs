//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - config.toml (default configuration)
//! - config.local.toml (git-ignored local overrides)
//! - Environment variables (`ENGINE_` prefix)
//!
//! ## Example
//!
//! ```toml
//! # config.toml
//! [chase]
//! scheduler = "grd"
//! trigger_computer = "semi-naive"
//!
//! [grd]
//! mode = "hybrid"
//! stratification = "minimal"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! ENGINE_CHASE__SCHEDULER=naive
//! ENGINE_SEARCH__STATIC_ORDERING=false
//! ```

use crate::chase::{ApplierStrategy, CheckerKind, RenamerStrategy, SchedulerStrategy, TriggerComputer};
use crate::grd::{GrdMode, StratificationStrategy};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level engine configuration (spec §4.12).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub chase: ChaseConfig,
    #[serde(default)]
    pub grd: GrdConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default chase strategy selections (spec §6 table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaseConfig {
    #[serde(default = "default_scheduler")]
    pub scheduler: SchedulerStrategy,
    #[serde(default = "default_trigger_computer")]
    pub trigger_computer: TriggerComputer,
    #[serde(default = "default_checker")]
    pub checker: CheckerKind,
    #[serde(default = "default_renamer")]
    pub renamer: RenamerStrategy,
    #[serde(default = "default_applier")]
    pub applier: ApplierStrategy,
    #[serde(default)]
    pub step_limit: Option<u64>,
    #[serde(default)]
    pub atom_limit: Option<usize>,
}

/// Default GRD construction mode + stratification strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrdConfig {
    #[serde(default = "default_grd_mode")]
    pub mode: GrdMode,
    #[serde(default = "default_stratification")]
    pub stratification: StratificationStrategy,
}

/// Default atom-ordering scheduler for FO query search, and whether
/// trace-level search logging is enabled (spec §4.11, `trace-search`
/// cargo feature).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_true")]
    pub static_ordering: bool,
    #[serde(default)]
    pub trace_search: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_scheduler() -> SchedulerStrategy {
    SchedulerStrategy::Naive
}
fn default_trigger_computer() -> TriggerComputer {
    TriggerComputer::Naive
}
fn default_checker() -> CheckerKind {
    CheckerKind::SemiOblivious
}
fn default_renamer() -> RenamerStrategy {
    RenamerStrategy::FrontierSkolem
}
fn default_applier() -> ApplierStrategy {
    ApplierStrategy::BreadthFirst
}
fn default_grd_mode() -> GrdMode {
    GrdMode::Predicate
}
fn default_stratification() -> StratificationStrategy {
    StratificationStrategy::ByScc
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ChaseConfig {
    fn default() -> Self {
        ChaseConfig {
            scheduler: default_scheduler(),
            trigger_computer: default_trigger_computer(),
            checker: default_checker(),
            renamer: default_renamer(),
            applier: default_applier(),
            step_limit: None,
            atom_limit: None,
        }
    }
}

impl Default for GrdConfig {
    fn default() -> Self {
        GrdConfig { mode: default_grd_mode(), stratification: default_stratification() }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { static_ordering: default_true(), trace_search: false }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

impl EngineConfig {
    /// Load configuration from default locations.
    ///
    /// Merges in order:
    /// 1. config.toml (base configuration)
    /// 2. config.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (`ENGINE_` prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("ENGINE_").split("__"))
            .extract()
    }

    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("ENGINE_").split("__"))
            .extract()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            chase: ChaseConfig::default(),
            grd: GrdConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.chase.scheduler, SchedulerStrategy::Naive);
        assert_eq!(config.grd.mode, GrdMode::Predicate);
        assert!(config.search.static_ordering);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[chase]"));
        assert!(toml_str.contains("[grd]"));
        assert!(toml_str.contains("[search]"));
    }
}
