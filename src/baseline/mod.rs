use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::input::{FeatureVector, read_value};
use crate::math::stats::{mean, std_pop};

const NEUTRAL_MEAN: f64 = 0.5;
const NEUTRAL_STD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorStats {
    pub mean: f64,
    pub std: f64,
    pub n: usize,
}

/// Per-patient reference statistics. Immutable once built; see [`recalibrate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub stats: BTreeMap<String, IndicatorStats>,
    pub complete: bool,
    pub sessions_used: usize,
    pub sessions_required: usize,
    pub high_variance: Vec<String>,
    pub needs_extension: bool,
    pub revision: u32,
    pub catalog_version: String,
}

impl Baseline {
    pub fn stats(&self, id: &str) -> Option<&IndicatorStats> {
        self.stats.get(id)
    }

    pub fn is_high_variance(&self, id: &str) -> bool {
        self.high_variance.iter().any(|h| h == id)
    }
}

pub fn calibrate(vectors: &[FeatureVector], catalog: &Catalog, config: &EngineConfig) -> Baseline {
    build(vectors, catalog, config, 0)
}

/// Builds a fresh baseline from a new window; `previous` is left untouched.
pub fn recalibrate(
    previous: &Baseline,
    vectors: &[FeatureVector],
    catalog: &Catalog,
    config: &EngineConfig,
) -> Baseline {
    let next = build(vectors, catalog, config, previous.revision + 1);
    info!(
        from_revision = previous.revision,
        to_revision = next.revision,
        "baseline_recalibrated"
    );
    next
}

fn build(
    vectors: &[FeatureVector],
    catalog: &Catalog,
    config: &EngineConfig,
    revision: u32,
) -> Baseline {
    let epsilon = config.std_epsilon;
    let ceiling = config.high_variance_ceiling();

    let mut stats = BTreeMap::new();
    let mut high_variance = Vec::new();
    let mut observed: Vec<f64> = Vec::with_capacity(vectors.len());
    for def in catalog.indicators() {
        observed.clear();
        observed.extend(vectors.iter().filter_map(|v| read_value(v, &def.id)));
        let entry = if observed.is_empty() {
            IndicatorStats {
                mean: NEUTRAL_MEAN,
                std: NEUTRAL_STD.max(epsilon),
                n: 0,
            }
        } else {
            let std = std_pop(&observed).max(epsilon);
            if std > ceiling {
                high_variance.push(def.id.clone());
            }
            IndicatorStats {
                mean: mean(&observed),
                std,
                n: observed.len(),
            }
        };
        stats.insert(def.id.clone(), entry);
    }

    let sessions_used = vectors.len();
    let sessions_required = config.required_sessions();
    let complete = sessions_used >= sessions_required;
    let needs_extension =
        high_variance.len() > config.extension_trigger && sessions_used < config.extended_sessions;

    if complete {
        info!(
            sessions = sessions_used,
            high_variance = high_variance.len(),
            needs_extension,
            "baseline_calibrated"
        );
    } else {
        warn!(
            sessions = sessions_used,
            required = sessions_required,
            "baseline incomplete"
        );
    }

    Baseline {
        stats,
        complete,
        sessions_used,
        sessions_required,
        high_variance,
        needs_extension,
        revision,
        catalog_version: catalog.version().to_string(),
    }
}
