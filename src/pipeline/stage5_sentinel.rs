use anyhow::Result;
use tracing::info;

use crate::ctx::SessionCtx;
use crate::pipeline::Stage;
use crate::scores::sentinel::check_sentinels;

pub struct Stage5Sentinel;

impl Stage5Sentinel {
    pub fn new() -> Self {
        Self
    }
}

impl<'a> Stage<SessionCtx<'a>> for Stage5Sentinel {
    fn name(&self) -> &'static str {
        "stage5_sentinel"
    }

    fn run(&self, ctx: &mut SessionCtx<'a>) -> Result<()> {
        let z = ctx
            .adjusted_z_scores
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("adjusted z-scores missing"))?;
        let alerts = check_sentinels(z, ctx.baseline, ctx.catalog);
        info!(alerts = alerts.len(), "sentinels_ready");
        ctx.sentinels = Some(alerts);
        Ok(())
    }
}
