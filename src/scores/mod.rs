pub mod cascade;
pub mod composite;
pub mod confounder;
pub mod sentinel;
pub mod weekly;
pub mod zscore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Condition, Confounder, Domain};
use crate::input::Confounders;

/// Indicator id to z-score; `None` when the indicator was not scored.
pub type ZScores = BTreeMap<String, Option<f64>>;

/// Domain to aggregate score; `None` when no member indicator had data.
pub type DomainScores = BTreeMap<Domain, Option<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl AlertLevel {
    pub fn from_composite(composite: f64) -> Self {
        if composite >= -0.5 {
            AlertLevel::Green
        } else if composite >= -1.0 {
            AlertLevel::Yellow
        } else if composite >= -1.5 {
            AlertLevel::Orange
        } else {
            AlertLevel::Red
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Green => "green",
            AlertLevel::Yellow => "yellow",
            AlertLevel::Orange => "orange",
            AlertLevel::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scored,
    BaselineIncomplete,
    NoIndicators,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeDetection {
    pub condition: Condition,
    pub stage: u8,
    pub name: String,
    pub description: String,
    pub severity: f64,
    pub confidence: f64,
    pub domains: Vec<Domain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeMatches {
    pub by_condition: BTreeMap<Condition, CascadeDetection>,
    pub all: Vec<CascadeDetection>,
}

impl CascadeMatches {
    pub fn get(&self, condition: Condition) -> Option<&CascadeDetection> {
        self.by_condition.get(&condition)
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelDetail {
    pub indicator: String,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentinelAlert {
    pub condition: Condition,
    pub triggered: usize,
    pub total: usize,
    pub confidence: f64,
    pub details: Vec<SentinelDetail>,
    pub suppressed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub status: SessionStatus,
    pub z_scores: ZScores,
    pub adjusted_z_scores: ZScores,
    pub damping: BTreeMap<Domain, f64>,
    pub domain_scores: DomainScores,
    pub composite: f64,
    pub alert: AlertLevel,
    pub cascades: CascadeMatches,
    pub sentinels: Vec<SentinelAlert>,
    pub indicators_scored: usize,
    pub confounders: Confounders,
    pub active_confounders: Vec<Confounder>,
}

impl SessionResult {
    /// Result carrying a status and no scores.
    pub fn unscored(status: SessionStatus, confounders: Confounders) -> Self {
        Self {
            status,
            z_scores: BTreeMap::new(),
            adjusted_z_scores: BTreeMap::new(),
            damping: BTreeMap::new(),
            domain_scores: BTreeMap::new(),
            composite: 0.0,
            alert: AlertLevel::Green,
            cascades: CascadeMatches::default(),
            sentinels: Vec::new(),
            indicators_scored: 0,
            confounders,
            active_confounders: confounders.active(),
        }
    }

    pub fn is_scored(&self) -> bool {
        self.status == SessionStatus::Scored
    }
}
