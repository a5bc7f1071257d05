use anyhow::Result;
use tracing::info;

use crate::ctx::SessionCtx;
use crate::pipeline::Stage;
use crate::scores::confounder::{apply_damping, damping_factors};

pub struct Stage2Confounders;

impl Stage2Confounders {
    pub fn new() -> Self {
        Self
    }
}

impl<'a> Stage<SessionCtx<'a>> for Stage2Confounders {
    fn name(&self) -> &'static str {
        "stage2_confounders"
    }

    fn run(&self, ctx: &mut SessionCtx<'a>) -> Result<()> {
        let z = ctx
            .z_scores
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("z-scores missing"))?;
        let factors = damping_factors(&ctx.input.confounders, ctx.catalog);
        let adjusted = apply_damping(z, &factors, ctx.catalog);
        info!(
            active = ctx.input.confounders.active().len(),
            "confounders_applied"
        );
        ctx.damping = Some(factors);
        ctx.adjusted_z_scores = Some(adjusted);
        Ok(())
    }
}
