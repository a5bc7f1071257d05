use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Domain};
use crate::input::Confounders;
use crate::math::stats::mean;
use crate::scores::cascade::detect_cascades;
use crate::scores::composite::composite;
use crate::scores::{AlertLevel, CascadeMatches, DomainScores, SessionResult, ZScores};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStatus {
    Aggregated,
    NoSessions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week: u32,
    pub status: WeekStatus,
    pub sessions_analyzed: usize,
    pub domain_scores: DomainScores,
    pub z_scores: ZScores,
    pub composite: f64,
    pub alert: AlertLevel,
    pub cascades: CascadeMatches,
    pub session_composites: Vec<f64>,
    pub trend: f64,
    pub confounders: Vec<Confounders>,
}

/// Averages the scored sessions of one week and rescores the averages.
pub fn aggregate_week(
    sessions: &[SessionResult],
    week: u32,
    catalog: &Catalog,
    renormalize: bool,
    noisy: &[Domain],
) -> WeekSummary {
    let scored: Vec<&SessionResult> = sessions.iter().filter(|s| s.is_scored()).collect();
    if scored.is_empty() {
        return WeekSummary {
            week,
            status: WeekStatus::NoSessions,
            sessions_analyzed: 0,
            domain_scores: DomainScores::new(),
            z_scores: ZScores::new(),
            composite: 0.0,
            alert: AlertLevel::Green,
            cascades: CascadeMatches::default(),
            session_composites: Vec::new(),
            trend: 0.0,
            confounders: sessions.iter().map(|s| s.confounders).collect(),
        };
    }

    let mut domain_scores = DomainScores::new();
    for domain in Domain::ALL {
        let values: Vec<f64> = scored
            .iter()
            .filter_map(|s| s.domain_scores.get(&domain).copied().flatten())
            .collect();
        domain_scores.insert(domain, if values.is_empty() { None } else { Some(mean(&values)) });
    }

    let mut buckets: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for session in &scored {
        for (id, value) in &session.adjusted_z_scores {
            let bucket = buckets.entry(id.as_str()).or_default();
            if let Some(v) = value {
                bucket.push(*v);
            }
        }
    }
    let z_scores: ZScores = buckets
        .into_iter()
        .map(|(id, values)| {
            let avg = if values.is_empty() { None } else { Some(mean(&values)) };
            (id.to_string(), avg)
        })
        .collect();

    let week_composite = composite(&domain_scores, catalog, renormalize);
    let session_composites: Vec<f64> = scored.iter().map(|s| s.composite).collect();
    let trend = match (session_composites.first(), session_composites.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };

    WeekSummary {
        week,
        status: WeekStatus::Aggregated,
        sessions_analyzed: scored.len(),
        cascades: detect_cascades(&domain_scores, catalog, noisy),
        domain_scores,
        z_scores,
        composite: week_composite,
        alert: AlertLevel::from_composite(week_composite),
        session_composites,
        trend,
        confounders: sessions.iter().map(|s| s.confounders).collect(),
    }
}
