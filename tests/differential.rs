use kira_cvf::catalog::{Catalog, Condition, Domain};
use kira_cvf::differential::{
    DifferentialInput, DifferentialResult, Masses, TemporalPattern, detect_pattern, normalize,
    run_differential,
};
use kira_cvf::input::Confounders;
use kira_cvf::scores::cascade::detect_cascades;
use kira_cvf::scores::{AlertLevel, CascadeMatches, DomainScores, ZScores};

const PRIOR: f64 = 0.02;
const MIN_TIMELINE: usize = 7;

struct Case {
    domains: DomainScores,
    z: ZScores,
    cascades: CascadeMatches,
    history: Vec<Confounders>,
    timeline: Vec<f64>,
}

impl Case {
    fn new(domains: &[(Domain, f64)], z: &[(&str, f64)]) -> Self {
        let catalog = Catalog::builtin().unwrap();
        let mut scores: DomainScores = Domain::ALL.iter().map(|d| (*d, Some(0.0))).collect();
        for (domain, value) in domains {
            scores.insert(*domain, Some(*value));
        }
        let cascades = detect_cascades(&scores, &catalog, &[]);
        Self {
            domains: scores,
            z: z.iter().map(|(id, v)| (id.to_string(), Some(*v))).collect(),
            cascades,
            history: vec![Confounders::none()],
            timeline: vec![0.0],
        }
    }

    fn run(&self) -> DifferentialResult {
        let input = DifferentialInput {
            domain_scores: &self.domains,
            z_scores: &self.z,
            cascades: &self.cascades,
            confounder_history: &self.history,
            timeline: &self.timeline,
            alert: AlertLevel::Green,
        };
        run_differential(&input, PRIOR, MIN_TIMELINE)
    }
}

fn assert_distribution(result: &DifferentialResult) {
    assert_eq!(result.probabilities.len(), Condition::ALL.len());
    let sum: f64 = result.probabilities.values().sum();
    assert!((sum - 1.0).abs() < 1e-9, "sum={sum}");
    assert!(result.probabilities.values().all(|p| *p > 0.0));
    assert!(result.confidence > 0.0 && result.confidence <= 0.95);
    assert!(result.probability(result.primary) >= result.probability(result.secondary));
    assert_ne!(result.primary, result.secondary);
}

#[test]
fn neutral_input_favours_normal_aging() {
    let case = Case::new(
        &[],
        &[
            ("SEM_REF_COHERENCE", 0.0),
            ("DIS_SELF_CORRECTION", 0.0),
            ("MEM_FREE_RECALL", 0.0),
        ],
    );
    let result = case.run();
    assert_distribution(&result);
    assert_eq!(result.primary, Condition::NormalAging);
    assert!(result.fired.contains(&"global_stability".to_string()));
    assert!(result.recommendations.iter().any(|r| r.contains("monitoring")));
}

#[test]
fn empty_input_is_still_a_distribution() {
    let mut case = Case::new(&[], &[]);
    case.domains.clear();
    case.history.clear();
    case.timeline.clear();
    let result = case.run();
    assert_distribution(&result);
    assert_eq!(result.pattern, TemporalPattern::InsufficientData);
}

#[test]
fn language_first_decline_points_to_alzheimer() {
    let case = Case::new(
        &[
            (Domain::Lexical, -1.0),
            (Domain::Semantic, -1.0),
            (Domain::Syntactic, -0.7),
            (Domain::Memory, -1.0),
        ],
        &[
            ("SEM_REF_COHERENCE", -1.0),
            ("SEM_IDEA_DENSITY", -1.0),
            ("MEM_FREE_RECALL", -1.0),
            ("MEM_CUED_RECALL", -1.0),
            ("TMP_WITHIN_CLAUSE", -1.0),
            ("DIS_SELF_CORRECTION", -1.0),
        ],
    );
    assert_eq!(case.cascades.get(Condition::Alzheimer).unwrap().stage, 2);
    let result = case.run();
    assert_distribution(&result);
    assert_eq!(result.primary, Condition::Alzheimer);
    assert!(result.confidence > 0.6);
    assert!(result.fired.contains(&"ad_cascade".to_string()));
    assert!(result.evidence[&Condition::Alzheimer].len() >= 6);
    assert!(result.recommendations.iter().any(|r| r.contains("cognitive screening")));
}

#[test]
fn retrieval_deficit_points_to_depression() {
    let case = Case::new(
        &[(Domain::Affective, -0.8), (Domain::Memory, -0.5)],
        &[
            ("AFF_SELF_PRONOUN", -1.0),
            ("AFF_NEG_VALENCE", -1.0),
            ("AFF_HEDONIC", -1.0),
            ("MEM_FREE_RECALL", -1.0),
            ("MEM_CUED_RECALL", 0.0),
            ("SEM_REF_COHERENCE", 0.0),
            ("DIS_SELF_CORRECTION", 0.0),
            ("TMP_RESPONSE_LATENCY", -1.5),
        ],
    );
    let result = case.run();
    assert_distribution(&result);
    assert_eq!(result.primary, Condition::Depression);
    assert!(result.flags.contains(&"mdd_vs_bipolar_noted".to_string()));
    assert!(!result.fired.contains(&"global_stability".to_string()));
    assert!(result.recommendations.iter().any(|r| r.contains("mood screening")));
}

#[test]
fn motor_speech_points_to_parkinson_with_msa_secondary() {
    let case = Case::new(
        &[
            (Domain::Acoustic, -0.6),
            (Domain::Motor, -0.6),
            (Domain::Temporal, -0.7),
        ],
        &[
            ("PDM_PPE", -1.0),
            ("PDM_RPDE", -1.0),
            ("ACU_HNR", -1.0),
            ("PDM_VSA", -1.0),
            ("ACU_F0_SD", 0.5),
            ("ACU_SHIMMER", -1.0),
            ("PDM_DDK_REG", -1.0),
        ],
    );
    let result = case.run();
    assert_distribution(&result);
    assert_eq!(result.primary, Condition::Parkinson);
    assert_eq!(result.secondary, Condition::Msa);
    assert!(result.fired.contains(&"msa_tremor".to_string()));
    assert!(result.recommendations.iter().any(|r| r.contains("DaTscan")));
}

#[test]
fn temporal_rule_needs_long_timeline() {
    let mut case = Case::new(&[], &[]);
    case.timeline = vec![0.0, -0.1, -0.2, -0.3, -0.4, -0.5];
    let short = case.run();
    assert!(matches!(short.pattern, TemporalPattern::MonotonicDecline { .. }));
    assert!(!short.fired.contains(&"temporal_pattern".to_string()));

    case.timeline.push(-0.6);
    let long = case.run();
    assert!(long.fired.contains(&"temporal_pattern".to_string()));
    assert!(long.probability(Condition::Alzheimer) > short.probability(Condition::Alzheimer));
}

#[test]
fn confounded_window_downweights_progressive() {
    let base = Case::new(&[(Domain::Lexical, -0.6), (Domain::Semantic, -0.6)], &[]);
    let clean = base.run();

    let mut sick = Case::new(&[(Domain::Lexical, -0.6), (Domain::Semantic, -0.6)], &[]);
    let ill = Confounders { illness: true, ..Confounders::none() };
    sick.history = vec![ill, ill, Confounders::none()];
    let result = sick.run();
    assert_distribution(&result);
    assert!(result.flags.contains(&"confounded_window".to_string()));
    assert!(result.probability(Condition::NormalAging) > clean.probability(Condition::NormalAging));
}

#[test]
fn prodromal_monopitch_is_flagged() {
    let case = Case::new(&[(Domain::Motor, -0.1)], &[("PDM_MONOPITCH", -0.6)]);
    let result = case.run();
    assert!(result.flags.contains(&"prodromal_pd_rbd_flag".to_string()));
    assert!(!result.evidence[&Condition::Parkinson].is_empty());
}

#[test]
fn distribution_holds_across_inputs() {
    let ids = [
        "SEM_REF_COHERENCE",
        "MEM_FREE_RECALL",
        "MEM_CUED_RECALL",
        "AFF_SELF_PRONOUN",
        "PDM_PPE",
        "PDM_RPDE",
        "ACU_HNR",
        "LEX_VERBAL_OUTPUT",
    ];
    for step in 0..12 {
        let z = -3.0 + 0.5 * step as f64;
        let pairs: Vec<(&str, f64)> = ids.iter().map(|id| (*id, z)).collect();
        let domains: Vec<(Domain, f64)> = Domain::ALL.iter().map(|d| (*d, z / 2.0)).collect();
        let result = Case::new(&domains, &pairs).run();
        assert_distribution(&result);
    }
}

#[test]
fn normalize_handles_negative_and_zero_mass() {
    let zero: Masses = Condition::ALL.iter().map(|c| (*c, 0.0)).collect();
    let p = normalize(&zero, PRIOR);
    for value in p.values() {
        assert!((value - 1.0 / 8.0).abs() < 1e-12);
    }

    let mut masses = zero.clone();
    masses.insert(Condition::Alzheimer, -0.4);
    masses.insert(Condition::Depression, 0.18);
    let p = normalize(&masses, PRIOR);
    let sum: f64 = p.values().sum();
    assert!((sum - 1.0).abs() < 1e-12);
    assert!((p[&Condition::Alzheimer] - p[&Condition::Grief]).abs() < 1e-12);
    assert!((p[&Condition::Depression] - 0.20 / 0.34).abs() < 1e-12);
}

#[test]
fn temporal_pattern_shapes() {
    assert_eq!(detect_pattern(&[0.0, -0.5, -1.0]), TemporalPattern::InsufficientData);
    assert!(matches!(
        detect_pattern(&[0.0, -0.1, -0.2, -0.3, -0.4, -0.5]),
        TemporalPattern::MonotonicDecline { points: 6, .. }
    ));
    assert_eq!(
        detect_pattern(&[0.0, 0.3, 0.0, 0.3, 0.0]),
        TemporalPattern::Episodic { oscillations: 3 }
    );
    match detect_pattern(&[0.0, 0.0, 0.0, -0.8, -0.8]) {
        TemporalPattern::AcuteDrop { at, magnitude } => {
            assert_eq!(at, 3);
            assert!((magnitude + 0.8).abs() < 1e-12);
        }
        other => panic!("unexpected pattern {other:?}"),
    }
    assert!(matches!(
        detect_pattern(&[0.0, 0.05, -0.05, 0.02]),
        TemporalPattern::Stable { .. }
    ));
    assert_eq!(detect_pattern(&[0.0, 0.4, 0.8, 1.2]), TemporalPattern::Unclear);
}
