mod loader;
mod validate;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

pub use loader::{CatalogTables, load_builtin_v1, load_overlay_dir, merge_tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Lexical,
    Syntactic,
    Semantic,
    Temporal,
    Memory,
    Discourse,
    Affective,
    Acoustic,
    Motor,
}

impl Domain {
    pub const ALL: [Domain; 9] = [
        Domain::Lexical,
        Domain::Syntactic,
        Domain::Semantic,
        Domain::Temporal,
        Domain::Memory,
        Domain::Discourse,
        Domain::Affective,
        Domain::Acoustic,
        Domain::Motor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Lexical => "lexical",
            Domain::Syntactic => "syntactic",
            Domain::Semantic => "semantic",
            Domain::Temporal => "temporal",
            Domain::Memory => "memory",
            Domain::Discourse => "discourse",
            Domain::Affective => "affective",
            Domain::Acoustic => "acoustic",
            Domain::Motor => "motor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate explanations for observed drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Alzheimer,
    Depression,
    Parkinson,
    NormalAging,
    Medication,
    Grief,
    Msa,
    Psp,
}

impl Condition {
    pub const ALL: [Condition; 8] = [
        Condition::Alzheimer,
        Condition::Depression,
        Condition::Parkinson,
        Condition::NormalAging,
        Condition::Medication,
        Condition::Grief,
        Condition::Msa,
        Condition::Psp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Alzheimer => "alzheimer",
            Condition::Depression => "depression",
            Condition::Parkinson => "parkinson",
            Condition::NormalAging => "normal_aging",
            Condition::Medication => "medication",
            Condition::Grief => "grief",
            Condition::Msa => "msa",
            Condition::Psp => "psp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Text,
    Audio,
    MicroTask,
    Derived,
}

impl Source {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Source::Text),
            "audio" => Some(Source::Audio),
            "micro_task" => Some(Source::MicroTask),
            "derived" => Some(Source::Derived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confounder {
    Illness,
    PoorSleep,
    MedicationChange,
    EmotionalDistress,
}

impl Confounder {
    pub const ALL: [Confounder; 4] = [
        Confounder::Illness,
        Confounder::PoorSleep,
        Confounder::MedicationChange,
        Confounder::EmotionalDistress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Confounder::Illness => "illness",
            Confounder::PoorSleep => "poor_sleep",
            Confounder::MedicationChange => "medication_change",
            Confounder::EmotionalDistress => "emotional_distress",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Which side of a threshold counts as pathological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Below,
    Above,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "below" => Some(Direction::Below),
            "above" => Some(Direction::Above),
            _ => None,
        }
    }

    pub fn crosses(&self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::Below => value < threshold,
            Direction::Above => value > threshold,
        }
    }

    /// Distance past the threshold, positive when crossed.
    pub fn margin(&self, value: f64, threshold: f64) -> f64 {
        match self {
            Direction::Below => threshold - value,
            Direction::Above => value - threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDef {
    pub id: String,
    pub name: String,
    pub domain: Domain,
    pub source: Source,
    pub base_weight: f64,
    pub effect_sizes: BTreeMap<Condition, f64>,
    pub early_detection: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelDef {
    pub indicator: String,
    pub direction: Direction,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelSet {
    pub condition: Condition,
    pub activation_ratio: f64,
    pub sentinels: Vec<SentinelDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeCriterion {
    pub domain: Domain,
    pub direction: Direction,
    pub threshold: f64,
}

/// Criteria listed on a stage are the ones it adds; earlier stages still apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStage {
    pub stage: u8,
    pub name: String,
    pub description: String,
    pub criteria: Vec<CascadeCriterion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeLadder {
    pub condition: Condition,
    pub stages: Vec<CascadeStage>,
}

impl CascadeLadder {
    pub fn total_criteria(&self) -> usize {
        self.stages.iter().map(|s| s.criteria.len()).sum()
    }

    /// Domains in the order the ladder recruits them.
    pub fn recruitment_order(&self) -> Vec<Domain> {
        let mut order = Vec::new();
        for stage in &self.stages {
            for criterion in &stage.criteria {
                if !order.contains(&criterion.domain) {
                    order.push(criterion.domain);
                }
            }
        }
        order
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfounderProfile {
    pub confounder: Confounder,
    pub global: Option<f64>,
    pub domains: BTreeMap<Domain, f64>,
}

/// Immutable indicator registry injected into the engine.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    version: String,
    indicators: Vec<IndicatorDef>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    domain_weights: BTreeMap<Domain, f64>,
    sentinels: Vec<SentinelSet>,
    cascades: Vec<CascadeLadder>,
    confounders: Vec<ConfounderProfile>,
}

impl Catalog {
    pub fn builtin() -> Result<Self> {
        let tables = load_builtin_v1()?;
        Self::from_tables("v1", tables)
    }

    /// Built-in tables with any TSV files found in `dir` layered on top.
    pub fn with_overlay(dir: &Path) -> Result<Self> {
        let builtin = load_builtin_v1()?;
        let user = load_overlay_dir(dir)?;
        Self::from_tables("v1+overlay", merge_tables(builtin, user))
    }

    pub fn from_tables(version: &str, tables: CatalogTables) -> Result<Self> {
        let mut index = HashMap::with_capacity(tables.indicators.len());
        for (pos, def) in tables.indicators.iter().enumerate() {
            if index.insert(def.id.clone(), pos).is_some() {
                bail!("duplicate indicator '{}'", def.id);
            }
        }
        let catalog = Self {
            version: version.to_string(),
            indicators: tables.indicators,
            index,
            domain_weights: tables.domain_weights.into_iter().collect(),
            sentinels: tables.sentinels,
            cascades: tables.cascades,
            confounders: tables.confounders,
        };
        validate::validate(&catalog)?;
        Ok(catalog)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn indicators(&self) -> &[IndicatorDef] {
        &self.indicators
    }

    pub fn indicator(&self, id: &str) -> Option<&IndicatorDef> {
        self.index.get(id).map(|&pos| &self.indicators[pos])
    }

    pub fn domain_of(&self, id: &str) -> Option<Domain> {
        self.indicator(id).map(|def| def.domain)
    }

    pub fn indicators_in(&self, domain: Domain) -> impl Iterator<Item = &IndicatorDef> {
        self.indicators.iter().filter(move |def| def.domain == domain)
    }

    pub fn indicators_from(&self, source: Source) -> impl Iterator<Item = &IndicatorDef> {
        self.indicators.iter().filter(move |def| def.source == source)
    }

    pub fn early_detection(&self) -> impl Iterator<Item = &IndicatorDef> {
        self.indicators
            .iter()
            .filter(|def| !def.early_detection.is_empty())
    }

    pub fn domain_weights(&self) -> &BTreeMap<Domain, f64> {
        &self.domain_weights
    }

    pub fn domain_weight(&self, domain: Domain) -> f64 {
        self.domain_weights.get(&domain).copied().unwrap_or(0.0)
    }

    pub fn sentinel_sets(&self) -> &[SentinelSet] {
        &self.sentinels
    }

    pub fn sentinel_set(&self, condition: Condition) -> Option<&SentinelSet> {
        self.sentinels.iter().find(|s| s.condition == condition)
    }

    pub fn cascades(&self) -> &[CascadeLadder] {
        &self.cascades
    }

    pub fn cascade(&self, condition: Condition) -> Option<&CascadeLadder> {
        self.cascades.iter().find(|c| c.condition == condition)
    }

    pub fn confounder_profiles(&self) -> &[ConfounderProfile] {
        &self.confounders
    }

    pub fn confounder_profile(&self, confounder: Confounder) -> Option<&ConfounderProfile> {
        self.confounders.iter().find(|p| p.confounder == confounder)
    }

    /// Domain recruitment order of a condition's cascade, empty without one.
    pub fn recruitment_order(&self, condition: Condition) -> Vec<Domain> {
        self.cascade(condition)
            .map(|ladder| ladder.recruitment_order())
            .unwrap_or_default()
    }
}
