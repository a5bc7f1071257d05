use tracing::debug;

use crate::baseline::Baseline;
use crate::catalog::Catalog;
use crate::math::stats::fraction;
use crate::scores::{SentinelAlert, SentinelDetail, ZScores};

/// One alert per condition whose triggered fraction strictly exceeds its
/// activation ratio. High-variance indicators never trigger.
pub fn check_sentinels(z: &ZScores, baseline: &Baseline, catalog: &Catalog) -> Vec<SentinelAlert> {
    let mut alerts = Vec::new();
    for set in catalog.sentinel_sets() {
        let total = set.sentinels.len();
        let mut details = Vec::new();
        let mut suppressed = Vec::new();
        for sentinel in &set.sentinels {
            let Some(value) = z.get(&sentinel.indicator).copied().flatten() else {
                continue;
            };
            if !sentinel.direction.crosses(value, sentinel.threshold) {
                continue;
            }
            if baseline.is_high_variance(&sentinel.indicator) {
                suppressed.push(sentinel.indicator.clone());
                continue;
            }
            details.push(SentinelDetail {
                indicator: sentinel.indicator.clone(),
                z: value,
            });
        }

        let triggered = details.len();
        let ratio = fraction(triggered, total);
        if triggered == 0 || ratio <= set.activation_ratio {
            continue;
        }
        debug!(
            condition = %set.condition,
            triggered,
            total,
            "sentinel alert"
        );
        alerts.push(SentinelAlert {
            condition: set.condition,
            triggered,
            total,
            confidence: ratio,
            details,
            suppressed,
        });
    }
    alerts
}
