use anyhow::Result;

use crate::ctx::WeeklyCtx;
use crate::differential::{DifferentialInput, run_differential};
use crate::pipeline::Stage;

pub struct Stage7Differential;

impl Stage7Differential {
    pub fn new() -> Self {
        Self
    }
}

impl<'a> Stage<WeeklyCtx<'a>> for Stage7Differential {
    fn name(&self) -> &'static str {
        "stage7_differential"
    }

    fn run(&self, ctx: &mut WeeklyCtx<'a>) -> Result<()> {
        let timeline = ctx.timeline();
        let summary = ctx
            .summary
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("week summary missing"))?;
        let input = DifferentialInput::from_week(summary, &timeline);
        let result = run_differential(
            &input,
            ctx.config.uniform_prior,
            ctx.config.min_timeline_points,
        );
        ctx.differential = Some(result);
        Ok(())
    }
}
