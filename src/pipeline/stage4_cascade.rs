use anyhow::Result;
use tracing::info;

use crate::ctx::SessionCtx;
use crate::pipeline::Stage;
use crate::scores::cascade::{detect_cascades, noisy_domains};

pub struct Stage4Cascade;

impl Stage4Cascade {
    pub fn new() -> Self {
        Self
    }
}

impl<'a> Stage<SessionCtx<'a>> for Stage4Cascade {
    fn name(&self) -> &'static str {
        "stage4_cascade"
    }

    fn run(&self, ctx: &mut SessionCtx<'a>) -> Result<()> {
        let z = ctx
            .z_scores
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("z-scores missing"))?;
        let scores = ctx
            .domain_scores
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("domain scores missing"))?;
        let noisy = noisy_domains(
            z,
            ctx.baseline,
            ctx.catalog,
            ctx.config.noisy_domain_fraction,
        );
        let cascades = detect_cascades(scores, ctx.catalog, &noisy);
        info!(
            detected = cascades.all.len(),
            noisy = noisy.len(),
            "cascade_ready"
        );
        ctx.noisy_domains = noisy;
        ctx.cascades = Some(cascades);
        Ok(())
    }
}
