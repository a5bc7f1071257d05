use std::collections::BTreeMap;

use crate::catalog::{Catalog, Domain};
use crate::input::Confounders;
use crate::scores::ZScores;

/// Per-domain multiplier for the active confounders.
///
/// Global factors do not stack: the strongest one applies. Domain-specific
/// factors multiply on top of it.
pub fn damping_factors(confounders: &Confounders, catalog: &Catalog) -> BTreeMap<Domain, f64> {
    let mut global = 1.0f64;
    let mut per_domain: BTreeMap<Domain, f64> = Domain::ALL.iter().map(|d| (*d, 1.0)).collect();

    for confounder in confounders.active() {
        let Some(profile) = catalog.confounder_profile(confounder) else {
            continue;
        };
        if let Some(factor) = profile.global {
            global = global.min(factor);
        }
        for (domain, factor) in &profile.domains {
            if let Some(slot) = per_domain.get_mut(domain) {
                *slot *= factor;
            }
        }
    }

    for factor in per_domain.values_mut() {
        *factor *= global;
    }
    per_domain
}

pub fn apply_damping(z: &ZScores, factors: &BTreeMap<Domain, f64>, catalog: &Catalog) -> ZScores {
    z.iter()
        .map(|(id, value)| {
            let factor = catalog
                .domain_of(id)
                .and_then(|d| factors.get(&d).copied())
                .unwrap_or(1.0);
            (id.clone(), value.map(|v| v * factor))
        })
        .collect()
}
