use crate::catalog::{Catalog, Domain};
use crate::math::stats::mean;
use crate::scores::{DomainScores, ZScores};

pub fn domain_scores(z: &ZScores, catalog: &Catalog) -> DomainScores {
    let mut out = DomainScores::new();
    let mut members: Vec<f64> = Vec::new();
    for domain in Domain::ALL {
        members.clear();
        members.extend(
            catalog
                .indicators_in(domain)
                .filter_map(|def| z.get(&def.id).copied().flatten()),
        );
        let score = if members.is_empty() {
            None
        } else {
            Some(mean(&members))
        };
        out.insert(domain, score);
    }
    out
}

/// Weighted sum over observed domains. Missing domains contribute nothing
/// and, unless `renormalize` is set, their weight is not redistributed.
pub fn composite(scores: &DomainScores, catalog: &Catalog, renormalize: bool) -> f64 {
    let mut total = 0.0;
    let mut weight_used = 0.0;
    for (domain, score) in scores {
        if let Some(score) = score {
            let weight = catalog.domain_weight(*domain);
            total += weight * score;
            weight_used += weight;
        }
    }
    if renormalize && weight_used > 0.0 {
        total / weight_used
    } else {
        total
    }
}
