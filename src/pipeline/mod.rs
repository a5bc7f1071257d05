use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

pub mod stage1_zscores;
pub mod stage2_confounders;
pub mod stage3_domains;
pub mod stage4_cascade;
pub mod stage5_sentinel;
pub mod stage6_weekly;
pub mod stage7_differential;
pub mod stage8_trajectory;

use crate::ctx::{SessionCtx, WeeklyCtx};

/// Contexts report when a data condition makes later stages pointless.
pub trait StageCtx {
    fn halted(&self) -> bool;
}

pub trait Stage<C> {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut C) -> Result<()>;
}

pub struct Pipeline<C> {
    stages: Vec<Box<dyn Stage<C>>>,
}

impl<C: StageCtx> Pipeline<C> {
    pub fn new(stages: Vec<Box<dyn Stage<C>>>) -> Self {
        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, ctx: &mut C) -> Result<()> {
        for stage in &self.stages {
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
            if ctx.halted() {
                info!(stage = stage.name(), "pipeline halted");
                break;
            }
        }
        Ok(())
    }
}

pub fn session_pipeline<'a>() -> Pipeline<SessionCtx<'a>> {
    Pipeline::new(vec![
        Box::new(stage1_zscores::Stage1ZScores::new()),
        Box::new(stage2_confounders::Stage2Confounders::new()),
        Box::new(stage3_domains::Stage3Domains::new()),
        Box::new(stage4_cascade::Stage4Cascade::new()),
        Box::new(stage5_sentinel::Stage5Sentinel::new()),
    ])
}

pub fn weekly_pipeline<'a>() -> Pipeline<WeeklyCtx<'a>> {
    Pipeline::new(vec![
        Box::new(stage6_weekly::Stage6Weekly::new()),
        Box::new(stage7_differential::Stage7Differential::new()),
        Box::new(stage8_trajectory::Stage8Trajectory::new()),
    ])
}
