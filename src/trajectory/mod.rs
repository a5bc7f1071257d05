pub mod models;
pub mod profile;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{Catalog, Condition, Domain};
use crate::config::EngineConfig;
use crate::math::stats::linear_slope;
use crate::scores::weekly::WeekSummary;
use crate::scores::{AlertLevel, DomainScores};

pub use models::{ModelRegistry, ProjectionContext, ProjectionModel};
pub use profile::{DeclineProfile, ProfileType, decline_profile};

const MIN_HISTORY: usize = 3;
const DEFAULT_BASE_CONFIDENCE: f64 = 0.5;
const MIN_BASE_CONFIDENCE: f64 = 0.05;

/// One week of history as seen by the predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub composite: f64,
    pub domain_scores: DomainScores,
}

impl HistoryPoint {
    pub fn domain(&self, domain: Domain) -> Option<f64> {
        self.domain_scores.get(&domain).copied().flatten()
    }
}

impl From<&WeekSummary> for HistoryPoint {
    fn from(week: &WeekSummary) -> Self {
        Self {
            composite: week.composite,
            domain_scores: week.domain_scores.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedState {
    pub composite: f64,
    pub domains: BTreeMap<Domain, f64>,
}

impl ProjectedState {
    pub fn advanced(&self, deltas: &BTreeMap<Domain, f64>, composite_delta: f64) -> Self {
        Self {
            composite: self.composite + composite_delta,
            domains: self
                .domains
                .iter()
                .map(|(d, v)| (*d, v + deltas.get(d).copied().unwrap_or(0.0)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub composite: f64,
    pub domains: BTreeMap<Domain, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPrediction {
    pub week_offset: usize,
    pub composite: f64,
    pub domains: BTreeMap<Domain, f64>,
    pub alert: AlertLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryStatus {
    Predicted,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPrediction {
    pub status: TrajectoryStatus,
    pub model: String,
    pub horizon_weeks: usize,
    pub predictions: Vec<WeekPrediction>,
    pub velocity: Velocity,
    pub twin: Vec<WeekPrediction>,
    pub decline_profile: DeclineProfile,
    pub confidence: f64,
}

impl TrajectoryPrediction {
    pub fn final_alert(&self) -> Option<AlertLevel> {
        self.predictions.last().map(|p| p.alert)
    }
}

/// Caller-provided context for a projection run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrajectoryRequest {
    pub primary: Option<Condition>,
    pub base_confidence: Option<f64>,
    pub cascade_stage: Option<u8>,
    pub weeks: usize,
}

/// Tunables taken from the engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct TrajectorySettings {
    pub velocity_window: usize,
    pub profile_window: usize,
    pub confidence_decay: f64,
}

impl From<&EngineConfig> for TrajectorySettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            velocity_window: config.velocity_window,
            profile_window: config.profile_window,
            confidence_decay: config.confidence_decay,
        }
    }
}

/// Confidence after `weeks` of horizon; strictly decreasing in `weeks`.
pub fn horizon_confidence(base: Option<f64>, weeks: usize, decay: f64) -> f64 {
    let base = base.unwrap_or(DEFAULT_BASE_CONFIDENCE).max(MIN_BASE_CONFIDENCE);
    base * decay.powi(weeks as i32)
}

/// Slope of composite and observed domains over the trailing window.
pub fn compute_velocity(history: &[HistoryPoint], window: usize) -> Velocity {
    let size = window.max(2).min(history.len());
    let recent = &history[history.len() - size..];
    let composites: Vec<f64> = recent.iter().map(|p| p.composite).collect();
    Velocity {
        composite: linear_slope(&composites),
        domains: profile::domain_slopes(recent),
    }
}

pub fn predict(
    history: &[HistoryPoint],
    request: &TrajectoryRequest,
    settings: &TrajectorySettings,
    catalog: &Catalog,
    registry: &ModelRegistry,
) -> TrajectoryPrediction {
    let model = registry.model_for(request.primary);
    let latest = match history.last() {
        Some(latest) if history.len() >= MIN_HISTORY => latest,
        _ => {
            info!(points = history.len(), "trajectory insufficient data");
            return TrajectoryPrediction {
                status: TrajectoryStatus::InsufficientData,
                model: model.name().to_string(),
                horizon_weeks: request.weeks,
                predictions: Vec::new(),
                velocity: Velocity::default(),
                twin: Vec::new(),
                decline_profile: DeclineProfile {
                    profile: ProfileType::Stable,
                    leading_edge: None,
                    predicted_next: None,
                    domain_velocities: BTreeMap::new(),
                },
                confidence: 0.0,
            };
        }
    };

    let start = ProjectedState {
        composite: latest.composite,
        domains: latest
            .domain_scores
            .iter()
            .filter_map(|(d, v)| v.map(|v| (*d, v)))
            .collect(),
    };
    let velocity = compute_velocity(history, settings.velocity_window);

    let (recruitment, recruited) = match request.primary.and_then(|c| catalog.cascade(c)) {
        Some(ladder) => {
            let recruited = match request.cascade_stage {
                Some(stage) => ladder
                    .stages
                    .iter()
                    .filter(|s| s.stage <= stage)
                    .flat_map(|s| s.criteria.iter().map(|c| c.domain))
                    .fold(Vec::new(), |mut acc, d| {
                        if !acc.contains(&d) {
                            acc.push(d);
                        }
                        acc
                    }),
                None => Vec::new(),
            };
            (ladder.recruitment_order(), recruited)
        }
        None => (Vec::new(), Vec::new()),
    };

    let ctx = ProjectionContext {
        start: &start,
        velocity: &velocity,
        cascade_stage: request.cascade_stage,
        recruitment: &recruitment,
        recruited: &recruited,
        domain_weights: catalog.domain_weights(),
    };

    let predictions = project(model, &start, request.weeks, &ctx);
    let twin = project(registry.aging(), &start, request.weeks, &ctx);
    let profile = decline_profile(history, settings.profile_window, catalog);
    let confidence = horizon_confidence(request.base_confidence, request.weeks, settings.confidence_decay);

    info!(
        model = model.name(),
        weeks = request.weeks,
        velocity = velocity.composite,
        confidence,
        "trajectory_ready"
    );

    TrajectoryPrediction {
        status: TrajectoryStatus::Predicted,
        model: model.name().to_string(),
        horizon_weeks: request.weeks,
        predictions,
        velocity,
        twin,
        decline_profile: profile,
        confidence,
    }
}

fn project(
    model: &dyn ProjectionModel,
    start: &ProjectedState,
    weeks: usize,
    ctx: &ProjectionContext<'_>,
) -> Vec<WeekPrediction> {
    let mut out = Vec::with_capacity(weeks);
    let mut state = start.clone();
    for week in 1..=weeks {
        state = model.step(&state, week, ctx);
        out.push(WeekPrediction {
            week_offset: week,
            composite: state.composite,
            domains: state.domains.clone(),
            alert: AlertLevel::from_composite(state.composite),
        });
    }
    out
}
