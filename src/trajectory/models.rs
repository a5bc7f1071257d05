use std::collections::BTreeMap;

use crate::catalog::{Condition, Domain};
use crate::trajectory::{ProjectedState, Velocity};

/// Per-week aging drift, derived from yearly rates.
pub fn weekly_aging_rate(domain: Domain) -> f64 {
    let yearly = match domain {
        Domain::Lexical => -0.02,
        Domain::Syntactic => -0.01,
        Domain::Semantic => -0.01,
        Domain::Temporal => -0.015,
        Domain::Memory => -0.02,
        Domain::Discourse => -0.005,
        Domain::Affective => -0.005,
        Domain::Acoustic => -0.01,
        Domain::Motor => -0.005,
    };
    yearly / 52.0
}

/// Inputs shared by every weekly step.
#[derive(Debug, Clone)]
pub struct ProjectionContext<'a> {
    pub start: &'a ProjectedState,
    pub velocity: &'a Velocity,
    pub cascade_stage: Option<u8>,
    pub recruitment: &'a [Domain],
    pub recruited: &'a [Domain],
    pub domain_weights: &'a BTreeMap<Domain, f64>,
}

impl ProjectionContext<'_> {
    fn weighted_delta(&self, deltas: &BTreeMap<Domain, f64>) -> f64 {
        deltas
            .iter()
            .map(|(d, delta)| self.domain_weights.get(d).copied().unwrap_or(0.0) * delta)
            .sum()
    }
}

/// Projects one week forward from `prev`. `week` starts at 1.
pub trait ProjectionModel: Send + Sync {
    fn name(&self) -> &'static str;
    fn step(&self, prev: &ProjectedState, week: usize, ctx: &ProjectionContext<'_>) -> ProjectedState;
}

/// Fixed small drift per domain; ignores observed velocity.
pub struct AgingModel;

impl ProjectionModel for AgingModel {
    fn name(&self) -> &'static str {
        "normal_aging"
    }

    fn step(&self, prev: &ProjectedState, _week: usize, ctx: &ProjectionContext<'_>) -> ProjectedState {
        let deltas: BTreeMap<Domain, f64> = prev
            .domains
            .keys()
            .map(|d| (*d, weekly_aging_rate(*d)))
            .collect();
        prev.advanced(&deltas, ctx.weighted_delta(&deltas))
    }
}

const DEFAULT_PROGRESSIVE_VELOCITY: f64 = -0.02;
const STAGE_ACCELERATION: f64 = 0.1;
const RECRUITED_BOOST: f64 = 1.5;
const NEXT_BOOST: f64 = 1.2;

/// Progressive decline that accelerates with cascade stage. Domains already
/// recruited by the cascade decline fastest, the next one moderately faster.
pub struct CascadeModel;

impl CascadeModel {
    fn boost(domain: Domain, ctx: &ProjectionContext<'_>) -> f64 {
        if ctx.recruited.contains(&domain) {
            return RECRUITED_BOOST;
        }
        let next = ctx.recruitment.iter().find(|d| !ctx.recruited.contains(d));
        if next == Some(&domain) {
            NEXT_BOOST
        } else {
            1.0
        }
    }
}

impl ProjectionModel for CascadeModel {
    fn name(&self) -> &'static str {
        "cascade"
    }

    fn step(&self, prev: &ProjectedState, _week: usize, ctx: &ProjectionContext<'_>) -> ProjectedState {
        let stage = ctx.cascade_stage.unwrap_or(0) as f64;
        let acceleration = 1.0 + STAGE_ACCELERATION * stage;
        let base = if ctx.velocity.composite < 0.0 {
            ctx.velocity.composite
        } else {
            DEFAULT_PROGRESSIVE_VELOCITY
        };
        let deltas: BTreeMap<Domain, f64> = prev
            .domains
            .keys()
            .map(|d| {
                let v = ctx.velocity.domains.get(d).copied().unwrap_or(0.0);
                (*d, v * Self::boost(*d, ctx))
            })
            .collect();
        prev.advanced(&deltas, base * acceleration)
    }
}

const RECOVERY_PER_WEEK: f64 = 0.02;

/// Partial recovery toward neutral, never past it.
pub struct EpisodicRecoveryModel;

fn recover(value: f64, rate: f64) -> f64 {
    (value + rate).min(value.max(0.0))
}

impl ProjectionModel for EpisodicRecoveryModel {
    fn name(&self) -> &'static str {
        "episodic_recovery"
    }

    fn step(&self, prev: &ProjectedState, _week: usize, _ctx: &ProjectionContext<'_>) -> ProjectedState {
        ProjectedState {
            composite: recover(prev.composite, RECOVERY_PER_WEEK),
            domains: prev
                .domains
                .iter()
                .map(|(d, v)| (*d, recover(*v, RECOVERY_PER_WEEK)))
                .collect(),
        }
    }
}

/// Motor-first decline with per-domain weekly rates. Motor domains may
/// accelerate by a fixed share each week.
pub struct MotorDominantModel {
    name: &'static str,
    base_rate: f64,
    rates: BTreeMap<Domain, f64>,
    motor_acceleration: f64,
}

impl MotorDominantModel {
    pub fn parkinson() -> Self {
        let base_rate = -0.01;
        let multipliers = [
            (Domain::Acoustic, 2.0),
            (Domain::Motor, 1.5),
            (Domain::Temporal, 1.2),
            (Domain::Lexical, 0.5),
            (Domain::Syntactic, 0.4),
            (Domain::Semantic, 0.3),
            (Domain::Memory, 0.4),
            (Domain::Discourse, 0.3),
            (Domain::Affective, 0.3),
        ];
        Self {
            name: "motor_dominant_pd",
            base_rate,
            rates: multipliers.iter().map(|(d, m)| (*d, base_rate * m)).collect(),
            motor_acceleration: 0.0,
        }
    }

    pub fn msa() -> Self {
        Self {
            name: "motor_dominant_msa",
            base_rate: -0.015,
            rates: BTreeMap::from([
                (Domain::Acoustic, -0.025),
                (Domain::Motor, -0.020),
                (Domain::Temporal, -0.018),
                (Domain::Lexical, -0.008),
                (Domain::Syntactic, -0.006),
                (Domain::Semantic, -0.005),
                (Domain::Memory, -0.006),
                (Domain::Discourse, -0.005),
                (Domain::Affective, -0.004),
            ]),
            motor_acceleration: 0.05,
        }
    }

    pub fn psp() -> Self {
        Self {
            name: "motor_dominant_psp",
            base_rate: -0.02,
            rates: BTreeMap::from([
                (Domain::Acoustic, -0.030),
                (Domain::Motor, -0.025),
                (Domain::Temporal, -0.020),
                (Domain::Lexical, -0.010),
                (Domain::Syntactic, -0.008),
                (Domain::Semantic, -0.008),
                (Domain::Memory, -0.010),
                (Domain::Discourse, -0.008),
                (Domain::Affective, -0.005),
            ]),
            motor_acceleration: 0.0,
        }
    }

    fn rate(&self, domain: Domain, week: usize) -> f64 {
        let rate = self.rates.get(&domain).copied().unwrap_or(self.base_rate * 0.5);
        let motor = matches!(domain, Domain::Acoustic | Domain::Motor | Domain::Temporal);
        if motor {
            rate * (1.0 + self.motor_acceleration * week as f64)
        } else {
            rate
        }
    }
}

impl ProjectionModel for MotorDominantModel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn step(&self, prev: &ProjectedState, week: usize, _ctx: &ProjectionContext<'_>) -> ProjectedState {
        let deltas: BTreeMap<Domain, f64> = prev
            .domains
            .keys()
            .map(|d| (*d, self.rate(*d, week)))
            .collect();
        prev.advanced(&deltas, self.base_rate)
    }
}

/// Linear return to neutral within `window_weeks`, flat afterwards.
pub struct TimeBoxedRecoveryModel {
    pub window_weeks: usize,
}

impl TimeBoxedRecoveryModel {
    fn remaining(&self, week: usize) -> f64 {
        if self.window_weeks == 0 || week >= self.window_weeks {
            0.0
        } else {
            1.0 - week as f64 / self.window_weeks as f64
        }
    }
}

impl ProjectionModel for TimeBoxedRecoveryModel {
    fn name(&self) -> &'static str {
        "time_boxed_recovery"
    }

    fn step(&self, _prev: &ProjectedState, week: usize, ctx: &ProjectionContext<'_>) -> ProjectedState {
        let remaining = self.remaining(week);
        ProjectedState {
            composite: ctx.start.composite * remaining,
            domains: ctx
                .start
                .domains
                .iter()
                .map(|(d, v)| (*d, v * remaining))
                .collect(),
        }
    }
}

/// Maps a primary hypothesis to its projection model; unknown conditions
/// fall back to normal aging.
pub struct ModelRegistry {
    models: BTreeMap<Condition, Box<dyn ProjectionModel>>,
    fallback: Box<dyn ProjectionModel>,
}

impl ModelRegistry {
    pub fn empty() -> Self {
        Self {
            models: BTreeMap::new(),
            fallback: Box::new(AgingModel),
        }
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Condition::Alzheimer, Box::new(CascadeModel));
        registry.register(Condition::Depression, Box::new(EpisodicRecoveryModel));
        registry.register(Condition::Grief, Box::new(EpisodicRecoveryModel));
        registry.register(Condition::Parkinson, Box::new(MotorDominantModel::parkinson()));
        registry.register(Condition::Msa, Box::new(MotorDominantModel::msa()));
        registry.register(Condition::Psp, Box::new(MotorDominantModel::psp()));
        registry.register(
            Condition::Medication,
            Box::new(TimeBoxedRecoveryModel { window_weeks: 3 }),
        );
        registry.register(Condition::NormalAging, Box::new(AgingModel));
        registry
    }

    pub fn register(&mut self, condition: Condition, model: Box<dyn ProjectionModel>) {
        self.models.insert(condition, model);
    }

    pub fn model_for(&self, condition: Option<Condition>) -> &dyn ProjectionModel {
        condition
            .and_then(|c| self.models.get(&c))
            .map(|m| &**m)
            .unwrap_or(&*self.fallback)
    }

    pub fn aging(&self) -> &dyn ProjectionModel {
        &*self.fallback
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
