use tracing::debug;

use crate::baseline::Baseline;
use crate::catalog::{CascadeCriterion, CascadeLadder, Catalog, Domain};
use crate::math::stats::fraction;
use crate::scores::{CascadeDetection, CascadeMatches, DomainScores, ZScores};

/// Domains whose scored indicators are mostly high-variance in the baseline.
pub fn noisy_domains(
    z: &ZScores,
    baseline: &Baseline,
    catalog: &Catalog,
    noisy_fraction: f64,
) -> Vec<Domain> {
    let mut out = Vec::new();
    for domain in Domain::ALL {
        let mut scored = 0usize;
        let mut noisy = 0usize;
        for def in catalog.indicators_in(domain) {
            if matches!(z.get(&def.id), Some(Some(_))) {
                scored += 1;
                if baseline.is_high_variance(&def.id) {
                    noisy += 1;
                }
            }
        }
        if scored > 0 && fraction(noisy, scored) > noisy_fraction {
            out.push(domain);
        }
    }
    out
}

pub fn detect_cascades(scores: &DomainScores, catalog: &Catalog, noisy: &[Domain]) -> CascadeMatches {
    let mut matches = CascadeMatches::default();
    for ladder in catalog.cascades() {
        if let Some(detection) = evaluate_ladder(ladder, scores, noisy) {
            debug!(
                condition = %detection.condition,
                stage = detection.stage,
                severity = detection.severity,
                "cascade stage reached"
            );
            matches.all.push(detection.clone());
            matches.by_condition.insert(detection.condition, detection);
        }
    }
    matches
}

fn satisfied(criterion: &CascadeCriterion, scores: &DomainScores) -> bool {
    match scores.get(&criterion.domain).copied().flatten() {
        Some(score) => criterion.direction.crosses(score, criterion.threshold),
        None => false,
    }
}

fn margin(criterion: &CascadeCriterion, scores: &DomainScores) -> f64 {
    scores
        .get(&criterion.domain)
        .copied()
        .flatten()
        .map(|score| criterion.direction.margin(score, criterion.threshold))
        .unwrap_or(0.0)
}

/// Highest stage whose cumulative criteria all hold.
fn evaluate_ladder(
    ladder: &CascadeLadder,
    scores: &DomainScores,
    noisy: &[Domain],
) -> Option<CascadeDetection> {
    let total = ladder.total_criteria();
    if total == 0 {
        return None;
    }
    let satisfied_total = ladder
        .stages
        .iter()
        .flat_map(|s| s.criteria.iter())
        .filter(|c| satisfied(c, scores))
        .count();

    for reached in (0..ladder.stages.len()).rev() {
        let cumulative: Vec<&CascadeCriterion> = ladder.stages[..=reached]
            .iter()
            .flat_map(|s| s.criteria.iter())
            .collect();
        if !cumulative.iter().all(|c| satisfied(c, scores)) {
            continue;
        }

        let severity = cumulative
            .iter()
            .map(|c| margin(c, scores))
            .fold(f64::INFINITY, f64::min);

        let mut domains: Vec<Domain> = Vec::new();
        for c in &cumulative {
            if !domains.contains(&c.domain) {
                domains.push(c.domain);
            }
        }

        let mut confidence = fraction(satisfied_total, total);
        if domains.iter().any(|d| noisy.contains(d)) {
            confidence *= 0.5;
        }

        let stage = &ladder.stages[reached];
        return Some(CascadeDetection {
            condition: ladder.condition,
            stage: stage.stage,
            name: stage.name.clone(),
            description: stage.description.clone(),
            severity,
            confidence,
            domains,
        });
    }
    None
}
