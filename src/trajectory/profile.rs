use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Condition, Domain};
use crate::math::stats::linear_slope_xy;
use crate::trajectory::HistoryPoint;

const MIN_POINTS: usize = 4;
pub const DECLINE_THRESHOLD: f64 = -0.005;

const GENERAL_ORDER: [Domain; 9] = [
    Domain::Lexical,
    Domain::Semantic,
    Domain::Temporal,
    Domain::Syntactic,
    Domain::Memory,
    Domain::Acoustic,
    Domain::Motor,
    Domain::Discourse,
    Domain::Affective,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Stable,
    CascadeLike,
    MotorLike,
    AffectiveLed,
    Uniform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclineProfile {
    pub profile: ProfileType,
    pub leading_edge: Option<Domain>,
    pub predicted_next: Option<Domain>,
    pub domain_velocities: BTreeMap<Domain, f64>,
}

impl DeclineProfile {
    fn stable(domain_velocities: BTreeMap<Domain, f64>) -> Self {
        Self {
            profile: ProfileType::Stable,
            leading_edge: None,
            predicted_next: None,
            domain_velocities,
        }
    }
}

/// Per-domain slope over `(x, y)` pairs, skipping weeks without a score.
pub(crate) fn domain_slopes(window: &[HistoryPoint]) -> BTreeMap<Domain, f64> {
    let mut out = BTreeMap::new();
    for domain in Domain::ALL {
        let points: Vec<(f64, f64)> = window
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.domain(domain).map(|v| (i as f64, v)))
            .collect();
        if points.len() >= 2 {
            out.insert(domain, linear_slope_xy(&points));
        }
    }
    out
}

pub fn decline_profile(history: &[HistoryPoint], window: usize, catalog: &Catalog) -> DeclineProfile {
    if history.len() < MIN_POINTS {
        return DeclineProfile::stable(BTreeMap::new());
    }
    let size = window.max(MIN_POINTS).min(history.len());
    let recent = &history[history.len() - size..];
    let velocities = domain_slopes(recent);

    let leading = velocities
        .iter()
        .filter(|(_, v)| **v < DECLINE_THRESHOLD)
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(d, _)| *d);
    let Some(leading) = leading else {
        return DeclineProfile::stable(velocities);
    };

    let (profile, condition) = match leading {
        Domain::Lexical | Domain::Semantic => (ProfileType::CascadeLike, Some(Condition::Alzheimer)),
        Domain::Acoustic | Domain::Motor => (ProfileType::MotorLike, Some(Condition::Parkinson)),
        Domain::Affective => (ProfileType::AffectiveLed, Some(Condition::Depression)),
        _ => (ProfileType::Uniform, None),
    };

    let mut order = condition
        .map(|c| catalog.recruitment_order(c))
        .unwrap_or_default();
    for domain in GENERAL_ORDER {
        if !order.contains(&domain) {
            order.push(domain);
        }
    }

    let predicted_next = next_domain(&order, leading, &velocities);

    DeclineProfile {
        profile,
        leading_edge: Some(leading),
        predicted_next,
        domain_velocities: velocities,
    }
}

/// First observed, not yet declining domain after `leading` in `order`.
fn next_domain(order: &[Domain], leading: Domain, velocities: &BTreeMap<Domain, f64>) -> Option<Domain> {
    let start = order.iter().position(|d| *d == leading).map(|p| p + 1).unwrap_or(0);
    (0..order.len())
        .map(|offset| order[(start + offset) % order.len()])
        .filter(|d| *d != leading)
        .find(|d| velocities.get(d).is_some_and(|v| *v >= DECLINE_THRESHOLD))
}
