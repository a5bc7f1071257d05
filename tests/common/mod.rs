#![allow(dead_code)]

use kira_cvf::Engine;
use kira_cvf::baseline::Baseline;
use kira_cvf::catalog::{Catalog, Domain};
use kira_cvf::input::{FeatureVector, SessionInput};
use kira_cvf::scores::SessionResult;

/// Baseline std for a flat 0.5 calibration window is the epsilon floor.
pub const EPS: f64 = 0.03;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn neutral_vector(catalog: &Catalog) -> FeatureVector {
    catalog
        .indicators()
        .iter()
        .map(|d| (d.id.clone(), Some(0.5)))
        .collect()
}

pub fn neutral_baseline(engine: &Engine) -> Baseline {
    let vectors: Vec<FeatureVector> = (0..14).map(|_| neutral_vector(engine.catalog())).collect();
    engine.calibrate(&vectors)
}

/// Raw value that scores `z` against a neutral baseline.
pub fn value_for_z(z: f64) -> f64 {
    0.5 + EPS * z
}

/// Neutral session with selected indicators moved to target z-scores.
pub fn session_with_z(catalog: &Catalog, targets: &[(&str, f64)]) -> SessionInput {
    let mut values = neutral_vector(catalog);
    for (id, z) in targets {
        values.insert(id.to_string(), Some(value_for_z(*z)));
    }
    SessionInput::new(values)
}

/// Neutral session with every indicator of the listed domains at target z.
pub fn session_with_domains(catalog: &Catalog, targets: &[(Domain, f64)]) -> SessionInput {
    let mut values = neutral_vector(catalog);
    for (domain, z) in targets {
        for def in catalog.indicators_in(*domain) {
            values.insert(def.id.clone(), Some(value_for_z(*z)));
        }
    }
    SessionInput::new(values)
}

/// Scores `n` sessions with lexical and semantic indicators at `z`.
pub fn language_week(engine: &Engine, baseline: &Baseline, z: f64, n: usize) -> Vec<SessionResult> {
    let inputs: Vec<SessionInput> = (0..n)
        .map(|_| session_with_domains(engine.catalog(), &[(Domain::Lexical, z), (Domain::Semantic, z)]))
        .collect();
    engine.score_batch(&inputs, baseline).unwrap()
}
