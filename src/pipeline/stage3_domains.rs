use anyhow::Result;
use tracing::info;

use crate::ctx::SessionCtx;
use crate::pipeline::Stage;
use crate::scores::AlertLevel;
use crate::scores::composite::{composite, domain_scores};

pub struct Stage3Domains;

impl Stage3Domains {
    pub fn new() -> Self {
        Self
    }
}

impl<'a> Stage<SessionCtx<'a>> for Stage3Domains {
    fn name(&self) -> &'static str {
        "stage3_domains"
    }

    fn run(&self, ctx: &mut SessionCtx<'a>) -> Result<()> {
        let adjusted = ctx
            .adjusted_z_scores
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("adjusted z-scores missing"))?;
        let scores = domain_scores(adjusted, ctx.catalog);
        let value = composite(
            &scores,
            ctx.catalog,
            ctx.config.renormalize_missing_domains,
        );
        let alert = AlertLevel::from_composite(value);
        info!(composite = value, alert = alert.as_str(), "composite_ready");
        ctx.domain_scores = Some(scores);
        ctx.composite = Some(value);
        ctx.alert = Some(alert);
        Ok(())
    }
}
