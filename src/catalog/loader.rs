use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::catalog::{
    CascadeCriterion, CascadeLadder, CascadeStage, Condition, Confounder, ConfounderProfile,
    Direction, Domain, IndicatorDef, SentinelDef, SentinelSet, Source,
};

const INDICATORS_FILE: &str = "indicators.tsv";
const DOMAINS_FILE: &str = "domains.tsv";
const SENTINELS_FILE: &str = "sentinels.tsv";
const CASCADES_FILE: &str = "cascades.tsv";
const CONFOUNDERS_FILE: &str = "confounders.tsv";

/// Raw catalog content before cross-table validation.
#[derive(Debug, Clone, Default)]
pub struct CatalogTables {
    pub indicators: Vec<IndicatorDef>,
    pub domain_weights: Vec<(Domain, f64)>,
    pub sentinels: Vec<SentinelSet>,
    pub cascades: Vec<CascadeLadder>,
    pub confounders: Vec<ConfounderProfile>,
}

pub fn load_builtin_v1() -> Result<CatalogTables> {
    Ok(CatalogTables {
        indicators: parse_indicators_tsv(
            include_str!("../../assets/catalog/indicators_v1.tsv"),
            "built-in indicators v1",
        )?,
        domain_weights: parse_domains_tsv(
            include_str!("../../assets/catalog/domains_v1.tsv"),
            "built-in domains v1",
        )?,
        sentinels: parse_sentinels_tsv(
            include_str!("../../assets/catalog/sentinels_v1.tsv"),
            "built-in sentinels v1",
        )?,
        cascades: parse_cascades_tsv(
            include_str!("../../assets/catalog/cascades_v1.tsv"),
            "built-in cascades v1",
        )?,
        confounders: parse_confounders_tsv(
            include_str!("../../assets/catalog/confounders_v1.tsv"),
            "built-in confounders v1",
        )?,
    })
}

/// Reads whichever catalog tables exist in `dir`; absent files yield empty tables.
pub fn load_overlay_dir(dir: &Path) -> Result<CatalogTables> {
    if !dir.is_dir() {
        bail!("catalog overlay {} is not a directory", dir.display());
    }
    let mut tables = CatalogTables::default();
    if let Some((content, source)) = read_optional(dir, INDICATORS_FILE)? {
        tables.indicators = parse_indicators_tsv(&content, &source)?;
    }
    if let Some((content, source)) = read_optional(dir, DOMAINS_FILE)? {
        tables.domain_weights = parse_domains_tsv(&content, &source)?;
    }
    if let Some((content, source)) = read_optional(dir, SENTINELS_FILE)? {
        tables.sentinels = parse_sentinels_tsv(&content, &source)?;
    }
    if let Some((content, source)) = read_optional(dir, CASCADES_FILE)? {
        tables.cascades = parse_cascades_tsv(&content, &source)?;
    }
    if let Some((content, source)) = read_optional(dir, CONFOUNDERS_FILE)? {
        tables.confounders = parse_confounders_tsv(&content, &source)?;
    }
    Ok(tables)
}

/// User rows replace built-in rows with the same key; new keys are appended.
/// Sentinel sets, cascade ladders and confounder profiles are replaced whole.
pub fn merge_tables(builtin: CatalogTables, user: CatalogTables) -> CatalogTables {
    CatalogTables {
        indicators: merge_by_key(builtin.indicators, user.indicators, |d| d.id.clone()),
        domain_weights: merge_by_key(builtin.domain_weights, user.domain_weights, |w| w.0),
        sentinels: merge_by_key(builtin.sentinels, user.sentinels, |s| s.condition),
        cascades: merge_by_key(builtin.cascades, user.cascades, |c| c.condition),
        confounders: merge_by_key(builtin.confounders, user.confounders, |p| p.confounder),
    }
}

fn merge_by_key<T, K, F>(mut builtin: Vec<T>, user: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    if user.is_empty() {
        return builtin;
    }
    let mut user_order = Vec::with_capacity(user.len());
    let mut user_map: HashMap<K, T> = HashMap::new();
    for row in user {
        let k = key(&row);
        if !user_map.contains_key(&k) {
            user_order.push(key(&row));
        }
        user_map.insert(k, row);
    }

    let mut merged = Vec::with_capacity(builtin.len() + user_map.len());
    for row in builtin.drain(..) {
        match user_map.remove(&key(&row)) {
            Some(user_row) => merged.push(user_row),
            None => merged.push(row),
        }
    }
    for k in user_order {
        if let Some(row) = user_map.remove(&k) {
            merged.push(row);
        }
    }
    merged
}

fn read_optional(dir: &Path, file: &str) -> Result<Option<(String, String)>> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read catalog TSV {}", path.display()))?;
    Ok(Some((content, path.display().to_string())))
}

/// Yields (line number, fields) for every data line.
fn tsv_rows<'a>(content: &'a str, source: &str, columns: usize) -> Result<Vec<(usize, Vec<&'a str>)>> {
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if parts.len() != columns {
            bail!(
                "{}:{} malformed TSV (expected {} columns)",
                source,
                line_no,
                columns
            );
        }
        if parts.iter().any(|p| p.is_empty()) {
            bail!("{}:{} empty field in TSV", source, line_no);
        }
        rows.push((line_no, parts));
    }
    Ok(rows)
}

fn parse_f64(raw: &str, source: &str, line_no: usize, field: &str) -> Result<f64> {
    let value: f64 = raw
        .parse()
        .with_context(|| format!("{}:{} invalid {} '{}'", source, line_no, field, raw))?;
    if !value.is_finite() {
        bail!("{}:{} {} must be finite", source, line_no, field);
    }
    Ok(value)
}

fn parse_domain(raw: &str, source: &str, line_no: usize) -> Result<Domain> {
    Domain::parse(raw).ok_or_else(|| anyhow::anyhow!("{}:{} unknown domain '{}'", source, line_no, raw))
}

fn parse_condition(raw: &str, source: &str, line_no: usize) -> Result<Condition> {
    Condition::parse(raw)
        .ok_or_else(|| anyhow::anyhow!("{}:{} unknown condition '{}'", source, line_no, raw))
}

fn parse_direction(raw: &str, source: &str, line_no: usize) -> Result<Direction> {
    Direction::parse(raw)
        .ok_or_else(|| anyhow::anyhow!("{}:{} direction must be below or above", source, line_no))
}

fn parse_indicators_tsv(content: &str, source: &str) -> Result<Vec<IndicatorDef>> {
    let mut out = Vec::new();
    for (line_no, parts) in tsv_rows(content, source, 7)? {
        let domain = parse_domain(parts[1], source, line_no)?;
        let src = Source::parse(parts[2])
            .ok_or_else(|| anyhow::anyhow!("{}:{} unknown source '{}'", source, line_no, parts[2]))?;
        let base_weight = parse_f64(parts[3], source, line_no, "base_weight")?;

        let mut effect_sizes = BTreeMap::new();
        if parts[4] != "-" {
            for pair in parts[4].split(',') {
                let (cond, size) = pair.split_once(':').ok_or_else(|| {
                    anyhow::anyhow!("{}:{} effect size must be condition:value", source, line_no)
                })?;
                let cond = parse_condition(cond.trim(), source, line_no)?;
                let size = parse_f64(size.trim(), source, line_no, "effect size")?;
                effect_sizes.insert(cond, size);
            }
        }

        let mut early_detection = Vec::new();
        if parts[5] != "-" {
            for cond in parts[5].split(',') {
                early_detection.push(parse_condition(cond.trim(), source, line_no)?);
            }
        }

        out.push(IndicatorDef {
            id: parts[0].to_string(),
            name: parts[6].to_string(),
            domain,
            source: src,
            base_weight,
            effect_sizes,
            early_detection,
        });
    }
    Ok(out)
}

fn parse_domains_tsv(content: &str, source: &str) -> Result<Vec<(Domain, f64)>> {
    let mut out: Vec<(Domain, f64)> = Vec::new();
    for (line_no, parts) in tsv_rows(content, source, 2)? {
        let domain = parse_domain(parts[0], source, line_no)?;
        let weight = parse_f64(parts[1], source, line_no, "weight")?;
        if out.iter().any(|(d, _)| *d == domain) {
            bail!("{}:{} duplicate weight for domain '{}'", source, line_no, domain);
        }
        out.push((domain, weight));
    }
    Ok(out)
}

fn parse_sentinels_tsv(content: &str, source: &str) -> Result<Vec<SentinelSet>> {
    let mut out: Vec<SentinelSet> = Vec::new();
    for (line_no, parts) in tsv_rows(content, source, 5)? {
        let condition = parse_condition(parts[0], source, line_no)?;
        let ratio = parse_f64(parts[1], source, line_no, "activation_ratio")?;
        let sentinel = SentinelDef {
            indicator: parts[2].to_string(),
            direction: parse_direction(parts[3], source, line_no)?,
            threshold: parse_f64(parts[4], source, line_no, "threshold")?,
        };

        match out.iter_mut().find(|s| s.condition == condition) {
            Some(set) => {
                if (set.activation_ratio - ratio).abs() > f64::EPSILON {
                    bail!(
                        "{}:{} activation ratio mismatch for condition '{}'",
                        source,
                        line_no,
                        condition
                    );
                }
                if set.sentinels.iter().any(|s| s.indicator == sentinel.indicator) {
                    bail!(
                        "{}:{} duplicate sentinel '{}' for condition '{}'",
                        source,
                        line_no,
                        sentinel.indicator,
                        condition
                    );
                }
                set.sentinels.push(sentinel);
            }
            None => out.push(SentinelSet {
                condition,
                activation_ratio: ratio,
                sentinels: vec![sentinel],
            }),
        }
    }
    Ok(out)
}

fn parse_cascades_tsv(content: &str, source: &str) -> Result<Vec<CascadeLadder>> {
    let mut out: Vec<CascadeLadder> = Vec::new();
    for (line_no, parts) in tsv_rows(content, source, 7)? {
        let condition = parse_condition(parts[0], source, line_no)?;
        let stage: u8 = parts[1]
            .parse()
            .with_context(|| format!("{}:{} invalid stage '{}'", source, line_no, parts[1]))?;
        let criterion = CascadeCriterion {
            domain: parse_domain(parts[3], source, line_no)?,
            direction: parse_direction(parts[4], source, line_no)?,
            threshold: parse_f64(parts[5], source, line_no, "threshold")?,
        };

        let pos = match out.iter().position(|l| l.condition == condition) {
            Some(pos) => pos,
            None => {
                out.push(CascadeLadder {
                    condition,
                    stages: Vec::new(),
                });
                out.len() - 1
            }
        };
        let ladder = &mut out[pos];
        match ladder.stages.iter_mut().find(|s| s.stage == stage) {
            Some(existing) => {
                if existing.name != parts[2] || existing.description != parts[6] {
                    bail!(
                        "{}:{} stage {} of '{}' redeclared with a different name or description",
                        source,
                        line_no,
                        stage,
                        condition
                    );
                }
                existing.criteria.push(criterion);
            }
            None => {
                let expected = ladder.stages.len();
                if stage as usize != expected {
                    bail!(
                        "{}:{} stage {} of '{}' out of order (expected {})",
                        source,
                        line_no,
                        stage,
                        condition,
                        expected
                    );
                }
                ladder.stages.push(CascadeStage {
                    stage,
                    name: parts[2].to_string(),
                    description: parts[6].to_string(),
                    criteria: vec![criterion],
                });
            }
        }
    }
    Ok(out)
}

fn parse_confounders_tsv(content: &str, source: &str) -> Result<Vec<ConfounderProfile>> {
    let mut out: Vec<ConfounderProfile> = Vec::new();
    for (line_no, parts) in tsv_rows(content, source, 3)? {
        let confounder = Confounder::parse(parts[0]).ok_or_else(|| {
            anyhow::anyhow!("{}:{} unknown confounder '{}'", source, line_no, parts[0])
        })?;
        let factor = parse_f64(parts[2], source, line_no, "factor")?;

        let pos = match out.iter().position(|p| p.confounder == confounder) {
            Some(pos) => pos,
            None => {
                out.push(ConfounderProfile {
                    confounder,
                    global: None,
                    domains: BTreeMap::new(),
                });
                out.len() - 1
            }
        };
        let profile = &mut out[pos];
        if parts[1] == "*" {
            if profile.global.is_some() {
                bail!("{}:{} duplicate global factor for '{}'", source, line_no, parts[0]);
            }
            profile.global = Some(factor);
        } else {
            let domain = parse_domain(parts[1], source, line_no)?;
            if profile.domains.insert(domain, factor).is_some() {
                bail!(
                    "{}:{} duplicate factor for '{}' on domain '{}'",
                    source,
                    line_no,
                    parts[0],
                    domain
                );
            }
        }
    }
    Ok(out)
}
