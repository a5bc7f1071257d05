pub mod recommend;
pub mod rules;
pub mod temporal;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::Condition;
use crate::input::Confounders;
use crate::scores::weekly::WeekSummary;
use crate::scores::{AlertLevel, CascadeMatches, DomainScores, ZScores};

pub use rules::{Contribution, RULES, Rule, RuleInput, RuleOutcome};
pub use temporal::{TemporalPattern, detect_pattern};

pub type Masses = BTreeMap<Condition, f64>;

const MAX_CONFIDENCE: f64 = 0.95;
const CONFIDENCE_FLOOR: f64 = 0.05;
const MARGIN_WEIGHT: f64 = 0.6;
const SUPPORT_WEIGHT: f64 = 0.07;
const SUPPORT_CAP: usize = 5;

/// Everything the rule set may look at.
#[derive(Debug, Clone, Copy)]
pub struct DifferentialInput<'a> {
    pub domain_scores: &'a DomainScores,
    pub z_scores: &'a ZScores,
    pub cascades: &'a CascadeMatches,
    pub confounder_history: &'a [Confounders],
    pub timeline: &'a [f64],
    pub alert: AlertLevel,
}

impl<'a> DifferentialInput<'a> {
    /// `timeline` is the composite history ending with this week.
    pub fn from_week(week: &'a WeekSummary, timeline: &'a [f64]) -> Self {
        Self {
            domain_scores: &week.domain_scores,
            z_scores: &week.z_scores,
            cascades: &week.cascades,
            confounder_history: &week.confounders,
            timeline,
            alert: week.alert,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialResult {
    pub probabilities: BTreeMap<Condition, f64>,
    pub primary: Condition,
    pub secondary: Condition,
    pub confidence: f64,
    pub rules_fired: usize,
    pub fired: Vec<String>,
    pub evidence: BTreeMap<Condition, Vec<String>>,
    pub flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub pattern: TemporalPattern,
}

impl DifferentialResult {
    pub fn probability(&self, condition: Condition) -> f64 {
        self.probabilities.get(&condition).copied().unwrap_or(0.0)
    }
}

pub fn run_differential(
    input: &DifferentialInput<'_>,
    uniform_prior: f64,
    min_timeline_points: usize,
) -> DifferentialResult {
    let pattern = detect_pattern(input.timeline);
    let rule_input = RuleInput {
        domain_scores: input.domain_scores,
        z_scores: input.z_scores,
        cascades: input.cascades,
        confounder_history: input.confounder_history,
        pattern: &pattern,
        timeline_len: input.timeline.len(),
        min_timeline_points,
    };

    let mut masses: Masses = Condition::ALL.iter().map(|c| (*c, 0.0)).collect();
    let mut evidence: BTreeMap<Condition, Vec<String>> =
        Condition::ALL.iter().map(|c| (*c, Vec::new())).collect();
    let mut flags: Vec<String> = Vec::new();
    let mut fired: Vec<String> = Vec::new();
    let mut support: BTreeMap<Condition, usize> = BTreeMap::new();

    for rule in RULES {
        let Some(outcome) = (rule.evaluate)(&rule_input, &masses) else {
            continue;
        };
        fired.push(rule.id.to_string());
        let mut supported: Vec<Condition> = Vec::new();
        for contribution in outcome.contributions {
            if !contribution.mass.is_finite() {
                continue;
            }
            if let Some(m) = masses.get_mut(&contribution.condition) {
                *m += contribution.mass;
            }
            if contribution.mass > 0.0 && !supported.contains(&contribution.condition) {
                supported.push(contribution.condition);
            }
            if let Some(list) = evidence.get_mut(&contribution.condition) {
                list.push(contribution.evidence);
            }
        }
        for condition in supported {
            *support.entry(condition).or_default() += 1;
        }
        for flag in outcome.flags {
            if !flags.iter().any(|f| f == flag) {
                flags.push(flag.to_string());
            }
        }
    }

    let probabilities = normalize(&masses, uniform_prior);
    let (primary, secondary) = top_two(&probabilities);
    let p1 = probabilities.get(&primary).copied().unwrap_or(0.0);
    let p2 = probabilities.get(&secondary).copied().unwrap_or(0.0);
    let primary_support = support.get(&primary).copied().unwrap_or(0);
    let confidence = confidence_from(p1, p2, primary_support);

    let recommendations =
        recommend::recommend(primary, secondary, confidence, &evidence, input.alert);

    info!(
        primary = %primary,
        secondary = %secondary,
        confidence,
        rules_fired = fired.len(),
        pattern = pattern.name(),
        "differential_ready"
    );

    DifferentialResult {
        probabilities,
        primary,
        secondary,
        confidence,
        rules_fired: fired.len(),
        fired,
        evidence,
        flags,
        recommendations,
        pattern,
    }
}

/// Clamps masses at zero, adds the prior everywhere and normalizes.
pub fn normalize(masses: &Masses, uniform_prior: f64) -> BTreeMap<Condition, f64> {
    let prior = if uniform_prior > 0.0 { uniform_prior } else { f64::EPSILON };
    let shifted: Vec<(Condition, f64)> = Condition::ALL
        .iter()
        .map(|c| (*c, masses.get(c).copied().unwrap_or(0.0).max(0.0) + prior))
        .collect();
    let total: f64 = shifted.iter().map(|(_, m)| m).sum();
    shifted.into_iter().map(|(c, m)| (c, m / total)).collect()
}

/// Ties resolve in catalog condition order.
fn top_two(probabilities: &BTreeMap<Condition, f64>) -> (Condition, Condition) {
    let mut ranked: Vec<(Condition, f64)> = Condition::ALL
        .iter()
        .map(|c| (*c, probabilities.get(c).copied().unwrap_or(0.0)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    (ranked[0].0, ranked[1].0)
}

fn confidence_from(p1: f64, p2: f64, primary_support: usize) -> f64 {
    let margin = if p1 > 0.0 { (p1 - p2) / p1 } else { 0.0 };
    let raw = CONFIDENCE_FLOOR
        + MARGIN_WEIGHT * margin
        + SUPPORT_WEIGHT * primary_support.min(SUPPORT_CAP) as f64;
    raw.min(MAX_CONFIDENCE)
}

