use anyhow::Result;

use crate::ctx::WeeklyCtx;
use crate::pipeline::Stage;
use crate::scores::weekly::WeekStatus;
use crate::trajectory::{HistoryPoint, TrajectoryRequest, TrajectorySettings, predict};

pub struct Stage8Trajectory;

impl Stage8Trajectory {
    pub fn new() -> Self {
        Self
    }
}

impl<'a> Stage<WeeklyCtx<'a>> for Stage8Trajectory {
    fn name(&self) -> &'static str {
        "stage8_trajectory"
    }

    fn run(&self, ctx: &mut WeeklyCtx<'a>) -> Result<()> {
        let summary = ctx
            .summary
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("week summary missing"))?;
        let differential = ctx
            .differential
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("differential missing"))?;
        let history: Vec<HistoryPoint> = ctx
            .history
            .iter()
            .chain(std::iter::once(summary))
            .filter(|w| w.status == WeekStatus::Aggregated)
            .map(HistoryPoint::from)
            .collect();
        let request = TrajectoryRequest {
            primary: Some(differential.primary),
            base_confidence: Some(differential.confidence),
            cascade_stage: summary.cascades.get(differential.primary).map(|c| c.stage),
            weeks: ctx.config.horizon_weeks,
        };
        let settings = TrajectorySettings::from(ctx.config);
        ctx.trajectory = Some(predict(
            &history,
            &request,
            &settings,
            ctx.catalog,
            ctx.registry,
        ));
        Ok(())
    }
}
