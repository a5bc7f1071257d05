use std::fs;

use kira_cvf::catalog::{
    Catalog, CatalogTables, Condition, Confounder, Direction, Domain, Source, load_builtin_v1,
    merge_tables,
};
use tempfile::TempDir;

#[test]
fn builtin_catalog_shape() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(catalog.version(), "v1");
    assert_eq!(catalog.indicators().len(), 85);
    assert_eq!(catalog.domain_weights().len(), 9);
    let sum: f64 = catalog.domain_weights().values().sum();
    assert!((sum - 1.0).abs() < 1e-6);
    for def in catalog.indicators() {
        assert!(catalog.domain_weights().contains_key(&def.domain), "{}", def.id);
    }
}

#[test]
fn builtin_parse_order_and_lookup() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(catalog.indicators()[0].id, "LEX_TTR");
    assert_eq!(catalog.domain_of("SEM_IDEA_DENSITY"), Some(Domain::Semantic));
    assert_eq!(catalog.domain_of("PDM_PPE"), Some(Domain::Motor));
    assert_eq!(catalog.domain_of("NOT_AN_INDICATOR"), None);
    assert!((catalog.domain_weight(Domain::Semantic) - 0.20).abs() < 1e-9);
    assert_eq!(catalog.indicators_in(Domain::Memory).count(), 6);
    assert!(catalog.indicators_from(Source::Audio).count() > 0);
    let idea = catalog.indicator("SEM_IDEA_DENSITY").unwrap();
    assert!(idea.effect_sizes.contains_key(&Condition::Alzheimer));
}

#[test]
fn builtin_sentinels() {
    let catalog = Catalog::builtin().unwrap();
    let alz = catalog.sentinel_set(Condition::Alzheimer).unwrap();
    assert_eq!(alz.sentinels.len(), 7);
    assert!((alz.activation_ratio - 0.25).abs() < 1e-9);
    assert!(alz.sentinels.iter().all(|s| s.direction == Direction::Below));
    assert_eq!(catalog.sentinel_set(Condition::Depression).unwrap().sentinels.len(), 7);
    let pd = catalog.sentinel_set(Condition::Parkinson).unwrap();
    assert_eq!(pd.sentinels.len(), 10);
    assert!((pd.activation_ratio - 0.15).abs() < 1e-9);
    assert!(catalog.sentinel_set(Condition::Grief).is_none());
}

#[test]
fn builtin_cascades_are_ordered() {
    let catalog = Catalog::builtin().unwrap();
    let alz = catalog.cascade(Condition::Alzheimer).unwrap();
    let stages: Vec<u8> = alz.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages, vec![0, 1, 2, 3]);
    assert_eq!(alz.total_criteria(), 8);
    assert_eq!(
        catalog.recruitment_order(Condition::Alzheimer),
        vec![
            Domain::Lexical,
            Domain::Semantic,
            Domain::Syntactic,
            Domain::Temporal,
            Domain::Memory
        ]
    );
    assert_eq!(catalog.recruitment_order(Condition::Parkinson)[0], Domain::Acoustic);
    assert_eq!(catalog.cascade(Condition::Depression).unwrap().stages.len(), 3);
    assert!(catalog.recruitment_order(Condition::Msa).is_empty());
}

#[test]
fn builtin_confounder_profiles() {
    let catalog = Catalog::builtin().unwrap();
    let illness = catalog.confounder_profile(Confounder::Illness).unwrap();
    assert_eq!(illness.global, Some(0.5));
    assert!(illness.domains.is_empty());
    let distress = catalog.confounder_profile(Confounder::EmotionalDistress).unwrap();
    assert_eq!(distress.global, None);
    assert_eq!(distress.domains.get(&Domain::Affective), Some(&0.3));
}

#[test]
fn overlay_overrides_and_appends() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("indicators.tsv"),
        "#id\tdomain\tsource\tweight\teffects\tearly\tname\n\
         LEX_TTR\tlexical\ttext\t0.1\t-\t-\tType-token ratio (site)\n\
         SEM_SITE_EXTRA\tsemantic\ttext\t0.4\talzheimer:0.5\talzheimer\tSite extra\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("sentinels.tsv"),
        "#condition\tratio\tindicator\tdirection\tthreshold\n\
         grief\t0.5\tAFF_NEG_VALENCE\tbelow\t-0.6\n\
         grief\t0.5\tAFF_HEDONIC\tbelow\t-0.6\n",
    )
    .unwrap();

    let catalog = Catalog::with_overlay(tmp.path()).unwrap();
    assert_eq!(catalog.version(), "v1+overlay");
    assert_eq!(catalog.indicators().len(), 86);
    assert_eq!(catalog.indicators()[0].id, "LEX_TTR");
    assert!((catalog.indicator("LEX_TTR").unwrap().base_weight - 0.1).abs() < 1e-9);
    assert_eq!(catalog.indicators().last().unwrap().id, "SEM_SITE_EXTRA");
    assert_eq!(catalog.domain_of("SEM_SITE_EXTRA"), Some(Domain::Semantic));
    assert!(catalog.early_detection().any(|d| d.id == "SEM_SITE_EXTRA"));
    let grief = catalog.sentinel_set(Condition::Grief).unwrap();
    assert_eq!(grief.sentinels.len(), 2);
    assert!(catalog.sentinel_set(Condition::Alzheimer).is_some());
}

#[test]
fn overlay_rejects_bad_domain_weights() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("domains.tsv"), "lexical\t0.5\n").unwrap();
    let err = Catalog::with_overlay(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("domain weights sum"), "{err}");
}

#[test]
fn overlay_reports_malformed_line() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("indicators.tsv"),
        "#header\nLEX_TTR\tlexical\ttext\n",
    )
    .unwrap();
    let err = Catalog::with_overlay(tmp.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("indicators.tsv:2"), "{msg}");
    assert!(msg.contains("malformed TSV"), "{msg}");
}

#[test]
fn overlay_rejects_unknown_domain() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("indicators.tsv"),
        "X_NEW\tcardiac\ttext\t0.5\t-\t-\tNope\n",
    )
    .unwrap();
    let err = Catalog::with_overlay(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("unknown domain 'cardiac'"));
}

#[test]
fn overlay_requires_directory() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("plain.tsv");
    fs::write(&file, "").unwrap();
    assert!(Catalog::with_overlay(&file).is_err());
}

#[test]
fn sentinel_on_unknown_indicator_is_rejected() {
    let mut tables = load_builtin_v1().unwrap();
    let user = CatalogTables {
        sentinels: vec![kira_cvf::catalog::SentinelSet {
            condition: Condition::Psp,
            activation_ratio: 0.2,
            sentinels: vec![kira_cvf::catalog::SentinelDef {
                indicator: "MISSING".to_string(),
                direction: Direction::Below,
                threshold: -0.5,
            }],
        }],
        ..CatalogTables::default()
    };
    tables = merge_tables(tables, user);
    assert!(Catalog::from_tables("test", tables).is_err());
}

#[test]
fn duplicate_indicator_is_rejected() {
    let mut tables = load_builtin_v1().unwrap();
    let first = tables.indicators[0].clone();
    tables.indicators.push(first);
    let err = Catalog::from_tables("test", tables).unwrap_err();
    assert!(err.to_string().contains("duplicate indicator"));
}

#[test]
fn catalogs_coexist() {
    let a = Catalog::builtin().unwrap();
    let mut tables = load_builtin_v1().unwrap();
    tables.indicators.retain(|d| d.domain != Domain::Discourse);
    let b = Catalog::from_tables("no-discourse", tables).unwrap();
    assert_eq!(a.indicators().len(), 85);
    assert_eq!(b.indicators_in(Domain::Discourse).count(), 0);
    assert_eq!(b.version(), "no-discourse");
}
