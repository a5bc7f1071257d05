use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::WeeklyCtx;
use crate::pipeline::Stage;
use crate::scores::ZScores;
use crate::scores::cascade::noisy_domains;
use crate::scores::weekly::{WeekStatus, aggregate_week};

pub struct Stage6Weekly;

impl Stage6Weekly {
    pub fn new() -> Self {
        Self
    }
}

impl<'a> Stage<WeeklyCtx<'a>> for Stage6Weekly {
    fn name(&self) -> &'static str {
        "stage6_weekly"
    }

    fn run(&self, ctx: &mut WeeklyCtx<'a>) -> Result<()> {
        // An indicator counts as observed this week if any scored session had it.
        let mut observed = ZScores::new();
        for session in ctx.sessions.iter().filter(|s| s.is_scored()) {
            for (id, value) in &session.z_scores {
                let slot = observed.entry(id.clone()).or_insert(None);
                if slot.is_none() {
                    *slot = *value;
                }
            }
        }
        let noisy = noisy_domains(
            &observed,
            ctx.baseline,
            ctx.catalog,
            ctx.config.noisy_domain_fraction,
        );
        let summary = aggregate_week(
            ctx.sessions,
            ctx.week,
            ctx.catalog,
            ctx.config.renormalize_missing_domains,
            &noisy,
        );
        if summary.status == WeekStatus::NoSessions {
            warn!(week = ctx.week, sessions = ctx.sessions.len(), "week has no scored sessions");
        } else {
            info!(
                week = ctx.week,
                sessions = summary.sessions_analyzed,
                composite = summary.composite,
                alert = summary.alert.as_str(),
                "week_aggregated"
            );
        }
        ctx.summary = Some(summary);
        Ok(())
    }
}
