use crate::baseline::Baseline;
use crate::catalog::Catalog;
use crate::input::{FeatureVector, read_value};
use crate::scores::ZScores;

/// One entry per catalog indicator. Null values and indicators missing from
/// the baseline stay `None`.
pub fn compute_zscores(
    values: &FeatureVector,
    baseline: &Baseline,
    catalog: &Catalog,
    std_floor: f64,
) -> ZScores {
    let mut out = ZScores::new();
    for def in catalog.indicators() {
        let z = match (read_value(values, &def.id), baseline.stats(&def.id)) {
            (Some(value), Some(stats)) => {
                let std = stats.std.max(std_floor);
                let z = (value - stats.mean) / std;
                if z.is_finite() { Some(z) } else { None }
            }
            _ => None,
        };
        out.insert(def.id.clone(), z);
    }
    out
}

pub fn count_scored(z: &ZScores) -> usize {
    z.values().filter(|v| v.is_some()).count()
}
