use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

#[cfg(feature = "mt")]
use rayon::prelude::*;

use crate::baseline::{self, Baseline};
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::ctx::{SessionCtx, WeeklyCtx, WeeklyReport};
use crate::differential::{DifferentialInput, DifferentialResult, run_differential};
use crate::input::{FeatureVector, SessionInput};
use crate::io::json_writer;
use crate::pipeline::stage6_weekly::Stage6Weekly;
use crate::pipeline::{Pipeline, Stage, session_pipeline, weekly_pipeline};
use crate::schema::v1::ReportV1;
use crate::scores::SessionResult;
use crate::scores::weekly::WeekSummary;
use crate::trajectory::{
    HistoryPoint, ModelRegistry, TrajectoryPrediction, TrajectoryRequest, TrajectorySettings,
    predict,
};

/// Owns the catalog, configuration and projection models. Holds no
/// per-patient state, so one engine can serve any number of callers.
pub struct Engine {
    catalog: Catalog,
    config: EngineConfig,
    registry: ModelRegistry,
}

impl Engine {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            config: EngineConfig::default(),
            registry: ModelRegistry::standard(),
        }
    }

    pub fn with_config(catalog: Catalog, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            config,
            registry: ModelRegistry::standard(),
        })
    }

    /// Built-in catalog and default configuration.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(Catalog::builtin()?))
    }

    /// Built-in catalog overlaid with `overlay_dir` (if any) and a JSON
    /// config file (if any).
    pub fn from_paths(overlay_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Self> {
        let catalog = match overlay_dir {
            Some(dir) => Catalog::with_overlay(dir)
                .with_context(|| format!("failed to load catalog overlay {}", dir.display()))?,
            None => Catalog::builtin()?,
        };
        let config = match config_path {
            Some(path) => EngineConfig::load_from_file(path)?,
            None => EngineConfig::default(),
        };
        Self::with_config(catalog, config)
    }

    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn calibrate(&self, vectors: &[FeatureVector]) -> Baseline {
        baseline::calibrate(vectors, &self.catalog, &self.config)
    }

    pub fn recalibrate(&self, previous: &Baseline, vectors: &[FeatureVector]) -> Baseline {
        baseline::recalibrate(previous, vectors, &self.catalog, &self.config)
    }

    /// Scores one session. An incomplete baseline or a vector with nothing
    /// scoreable yields an unscored result, not an error.
    pub fn score_session(&self, input: &SessionInput, baseline: &Baseline) -> Result<SessionResult> {
        let mut ctx = SessionCtx::new(&self.catalog, &self.config, baseline, input);
        session_pipeline().run(&mut ctx)?;
        ctx.finish()
    }

    /// Scores independent sessions against one baseline, preserving order.
    pub fn score_batch(
        &self,
        inputs: &[SessionInput],
        baseline: &Baseline,
    ) -> Result<Vec<SessionResult>> {
        let threads = self.config.threads;

        #[cfg(feature = "mt")]
        let results = {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if threads > 0 {
                builder = builder.num_threads(threads);
            }
            let pool = builder
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
            pool.install(|| {
                inputs
                    .par_iter()
                    .map(|input| self.score_session(input, baseline))
                    .collect::<Result<Vec<_>>>()
            })?
        };

        #[cfg(not(feature = "mt"))]
        let results = {
            let _ = threads;
            inputs
                .iter()
                .map(|input| self.score_session(input, baseline))
                .collect::<Result<Vec<_>>>()?
        };

        info!(
            sessions = inputs.len(),
            scored = results.iter().filter(|r| r.is_scored()).count(),
            "batch_scored"
        );
        Ok(results)
    }

    pub fn aggregate_week(
        &self,
        sessions: &[SessionResult],
        week: u32,
        baseline: &Baseline,
    ) -> Result<WeekSummary> {
        let mut ctx = WeeklyCtx::new(
            &self.catalog,
            &self.config,
            &self.registry,
            baseline,
            sessions,
            &[],
            week,
        );
        let stages: Vec<Box<dyn Stage<WeeklyCtx<'_>>>> = vec![Box::new(Stage6Weekly::new())];
        Pipeline::new(stages).run(&mut ctx)?;
        Ok(ctx.finish()?.summary)
    }

    /// `timeline` is the composite history ending with `week`.
    pub fn differential(&self, week: &WeekSummary, timeline: &[f64]) -> DifferentialResult {
        let input = DifferentialInput::from_week(week, timeline);
        run_differential(
            &input,
            self.config.uniform_prior,
            self.config.min_timeline_points,
        )
    }

    pub fn predict_trajectory(
        &self,
        history: &[HistoryPoint],
        differential: Option<&DifferentialResult>,
        cascade_stage: Option<u8>,
        weeks: usize,
    ) -> TrajectoryPrediction {
        let request = TrajectoryRequest {
            primary: differential.map(|d| d.primary),
            base_confidence: differential.map(|d| d.confidence),
            cascade_stage,
            weeks,
        };
        predict(
            history,
            &request,
            &TrajectorySettings::from(&self.config),
            &self.catalog,
            &self.registry,
        )
    }

    /// Full weekly cycle: aggregate, differential, trajectory. `history`
    /// holds earlier weeks, oldest first.
    pub fn process_week(
        &self,
        sessions: &[SessionResult],
        history: &[WeekSummary],
        week: u32,
        baseline: &Baseline,
    ) -> Result<WeeklyReport> {
        let mut ctx = WeeklyCtx::new(
            &self.catalog,
            &self.config,
            &self.registry,
            baseline,
            sessions,
            history,
            week,
        );
        weekly_pipeline().run(&mut ctx)?;
        ctx.finish()
    }

    pub fn report(&self, weekly: &WeeklyReport) -> ReportV1 {
        json_writer::build_report(&self.catalog, weekly)
    }
}
