use anyhow::{Result, bail};

use crate::catalog::Catalog;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

pub(super) fn validate(catalog: &Catalog) -> Result<()> {
    if catalog.indicators.is_empty() {
        bail!("catalog has no indicators");
    }
    for def in &catalog.indicators {
        if def.base_weight < 0.0 {
            bail!("indicator '{}' has a negative base weight", def.id);
        }
    }

    let mut sum = 0.0;
    for (domain, weight) in &catalog.domain_weights {
        if *weight < 0.0 {
            bail!("domain '{}' has a negative weight", domain);
        }
        sum += weight;
    }
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        bail!("domain weights sum to {:.6}, expected 1.0", sum);
    }
    for def in &catalog.indicators {
        if !catalog.domain_weights.contains_key(&def.domain) {
            bail!(
                "indicator '{}' belongs to domain '{}' which has no weight",
                def.id,
                def.domain
            );
        }
    }

    for set in &catalog.sentinels {
        if !(0.0..1.0).contains(&set.activation_ratio) {
            bail!(
                "sentinel activation ratio for '{}' must be in [0, 1)",
                set.condition
            );
        }
        for sentinel in &set.sentinels {
            if catalog.indicator(&sentinel.indicator).is_none() {
                bail!(
                    "sentinel '{}' for '{}' is not a known indicator",
                    sentinel.indicator,
                    set.condition
                );
            }
        }
    }

    for ladder in &catalog.cascades {
        if ladder.stages.is_empty() {
            bail!("cascade for '{}' has no stages", ladder.condition);
        }
        for stage in &ladder.stages {
            if stage.criteria.is_empty() {
                bail!(
                    "cascade '{}' stage {} has no criteria",
                    ladder.condition,
                    stage.stage
                );
            }
        }
    }

    for profile in &catalog.confounders {
        let factors = profile.global.iter().chain(profile.domains.values());
        for factor in factors {
            if !(*factor > 0.0 && *factor <= 1.0) {
                bail!(
                    "damping factor {} for '{}' must be in (0, 1]",
                    factor,
                    profile.confounder.as_str()
                );
            }
        }
    }

    Ok(())
}
