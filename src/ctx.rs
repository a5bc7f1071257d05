use std::collections::BTreeMap;

use anyhow::Result;

use crate::baseline::Baseline;
use crate::catalog::{Catalog, Domain};
use crate::config::EngineConfig;
use crate::differential::DifferentialResult;
use crate::input::SessionInput;
use crate::pipeline::StageCtx;
use crate::scores::weekly::{WeekStatus, WeekSummary};
use crate::scores::{
    AlertLevel, CascadeMatches, DomainScores, SentinelAlert, SessionResult, SessionStatus, ZScores,
};
use crate::trajectory::{ModelRegistry, TrajectoryPrediction};

/// State threaded through the per-session stages.
pub struct SessionCtx<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a EngineConfig,
    pub baseline: &'a Baseline,
    pub input: &'a SessionInput,
    pub status: Option<SessionStatus>,
    pub z_scores: Option<ZScores>,
    pub indicators_scored: usize,
    pub damping: Option<BTreeMap<Domain, f64>>,
    pub adjusted_z_scores: Option<ZScores>,
    pub domain_scores: Option<DomainScores>,
    pub composite: Option<f64>,
    pub alert: Option<AlertLevel>,
    pub noisy_domains: Vec<Domain>,
    pub cascades: Option<CascadeMatches>,
    pub sentinels: Option<Vec<SentinelAlert>>,
}

impl<'a> SessionCtx<'a> {
    pub fn new(
        catalog: &'a Catalog,
        config: &'a EngineConfig,
        baseline: &'a Baseline,
        input: &'a SessionInput,
    ) -> Self {
        Self {
            catalog,
            config,
            baseline,
            input,
            status: None,
            z_scores: None,
            indicators_scored: 0,
            damping: None,
            adjusted_z_scores: None,
            domain_scores: None,
            composite: None,
            alert: None,
            noisy_domains: Vec::new(),
            cascades: None,
            sentinels: None,
        }
    }

    /// Assembles the session result once the pipeline has run.
    pub fn finish(self) -> Result<SessionResult> {
        let confounders = self.input.confounders;
        if let Some(status) = self.status {
            return Ok(SessionResult::unscored(status, confounders));
        }
        let missing = |what: &str| anyhow::anyhow!("{what} missing after session pipeline");
        Ok(SessionResult {
            status: SessionStatus::Scored,
            z_scores: self.z_scores.ok_or_else(|| missing("z-scores"))?,
            adjusted_z_scores: self.adjusted_z_scores.ok_or_else(|| missing("adjusted z-scores"))?,
            damping: self.damping.ok_or_else(|| missing("damping factors"))?,
            domain_scores: self.domain_scores.ok_or_else(|| missing("domain scores"))?,
            composite: self.composite.ok_or_else(|| missing("composite"))?,
            alert: self.alert.ok_or_else(|| missing("alert"))?,
            cascades: self.cascades.ok_or_else(|| missing("cascades"))?,
            sentinels: self.sentinels.ok_or_else(|| missing("sentinels"))?,
            indicators_scored: self.indicators_scored,
            confounders,
            active_confounders: confounders.active(),
        })
    }
}

impl StageCtx for SessionCtx<'_> {
    fn halted(&self) -> bool {
        self.status.is_some()
    }
}

/// Output of the weekly pipeline.
#[derive(Debug, Clone)]
pub struct WeeklyReport {
    pub summary: WeekSummary,
    pub differential: Option<DifferentialResult>,
    pub trajectory: Option<TrajectoryPrediction>,
}

/// State threaded through the weekly stages. `history` holds earlier weeks,
/// oldest first, and excludes the week being processed.
pub struct WeeklyCtx<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a EngineConfig,
    pub registry: &'a ModelRegistry,
    pub baseline: &'a Baseline,
    pub sessions: &'a [SessionResult],
    pub history: &'a [WeekSummary],
    pub week: u32,
    pub summary: Option<WeekSummary>,
    pub differential: Option<DifferentialResult>,
    pub trajectory: Option<TrajectoryPrediction>,
}

impl<'a> WeeklyCtx<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: &'a Catalog,
        config: &'a EngineConfig,
        registry: &'a ModelRegistry,
        baseline: &'a Baseline,
        sessions: &'a [SessionResult],
        history: &'a [WeekSummary],
        week: u32,
    ) -> Self {
        Self {
            catalog,
            config,
            registry,
            baseline,
            sessions,
            history,
            week,
            summary: None,
            differential: None,
            trajectory: None,
        }
    }

    /// Composite timeline of aggregated weeks, ending with this one.
    pub fn timeline(&self) -> Vec<f64> {
        self.history
            .iter()
            .chain(self.summary.iter())
            .filter(|w| w.status == WeekStatus::Aggregated)
            .map(|w| w.composite)
            .collect()
    }

    pub fn finish(self) -> Result<WeeklyReport> {
        let summary = self
            .summary
            .ok_or_else(|| anyhow::anyhow!("week summary missing after weekly pipeline"))?;
        Ok(WeeklyReport {
            summary,
            differential: self.differential,
            trajectory: self.trajectory,
        })
    }
}

impl StageCtx for WeeklyCtx<'_> {
    fn halted(&self) -> bool {
        self.summary
            .as_ref()
            .is_some_and(|s| s.status == WeekStatus::NoSessions)
    }
}
