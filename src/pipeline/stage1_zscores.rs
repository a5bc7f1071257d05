use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::SessionCtx;
use crate::pipeline::Stage;
use crate::scores::SessionStatus;
use crate::scores::zscore::{compute_zscores, count_scored};

pub struct Stage1ZScores;

impl Stage1ZScores {
    pub fn new() -> Self {
        Self
    }
}

impl<'a> Stage<SessionCtx<'a>> for Stage1ZScores {
    fn name(&self) -> &'static str {
        "stage1_zscores"
    }

    fn run(&self, ctx: &mut SessionCtx<'a>) -> Result<()> {
        if !ctx.baseline.complete {
            warn!(
                sessions_used = ctx.baseline.sessions_used,
                sessions_required = ctx.baseline.sessions_required,
                "scoring skipped: baseline incomplete"
            );
            ctx.status = Some(SessionStatus::BaselineIncomplete);
            return Ok(());
        }
        let z = compute_zscores(
            &ctx.input.values,
            ctx.baseline,
            ctx.catalog,
            ctx.config.std_epsilon,
        );
        let scored = count_scored(&z);
        if scored == 0 {
            warn!("scoring skipped: no indicator could be scored");
            ctx.status = Some(SessionStatus::NoIndicators);
            return Ok(());
        }
        ctx.indicators_scored = scored;
        ctx.z_scores = Some(z);
        info!(scored, "zscores_ready");
        Ok(())
    }
}
