use kira_cvf::catalog::{Catalog, Condition, Domain};
use kira_cvf::config::EngineConfig;
use kira_cvf::scores::{AlertLevel, DomainScores};
use kira_cvf::trajectory::{
    HistoryPoint, ModelRegistry, ProfileType, TrajectoryPrediction, TrajectoryRequest,
    TrajectorySettings, TrajectoryStatus, decline_profile, horizon_confidence, predict,
};

fn uniform_point(composite: f64) -> HistoryPoint {
    HistoryPoint {
        composite,
        domain_scores: Domain::ALL.iter().map(|d| (*d, Some(composite))).collect(),
    }
}

fn linear_history(weeks: usize, rate: f64) -> Vec<HistoryPoint> {
    (0..weeks).map(|w| uniform_point(rate * w as f64)).collect()
}

fn run(history: &[HistoryPoint], primary: Option<Condition>, stage: Option<u8>, weeks: usize) -> TrajectoryPrediction {
    let catalog = Catalog::builtin().unwrap();
    let registry = ModelRegistry::standard();
    let settings = TrajectorySettings::from(&EngineConfig::default());
    let request = TrajectoryRequest {
        primary,
        base_confidence: Some(0.7),
        cascade_stage: stage,
        weeks,
    };
    predict(history, &request, &settings, &catalog, &registry)
}

#[test]
fn short_history_is_insufficient() {
    for n in 0..3 {
        let prediction = run(&linear_history(n, -0.1), Some(Condition::Alzheimer), None, 12);
        assert_eq!(prediction.status, TrajectoryStatus::InsufficientData);
        assert!(prediction.predictions.is_empty());
        assert!(prediction.twin.is_empty());
        assert_eq!(prediction.final_alert(), None);
    }
}

#[test]
fn horizon_length_is_exact() {
    let history = linear_history(3, -0.05);
    for weeks in [1, 4, 12, 26] {
        let prediction = run(&history, Some(Condition::Depression), None, weeks);
        assert_eq!(prediction.status, TrajectoryStatus::Predicted);
        assert_eq!(prediction.predictions.len(), weeks);
        assert_eq!(prediction.twin.len(), weeks);
        let offsets: Vec<usize> = prediction.predictions.iter().map(|p| p.week_offset).collect();
        assert_eq!(offsets, (1..=weeks).collect::<Vec<_>>());
    }
}

#[test]
fn confidence_decreases_with_horizon() {
    let history = linear_history(6, -0.1);
    let mut prev = f64::INFINITY;
    for weeks in 1..40 {
        let c = run(&history, Some(Condition::Alzheimer), None, weeks).confidence;
        assert!(c < prev);
        assert!(c > 0.0);
        prev = c;
    }
    assert!((horizon_confidence(None, 0, 0.97) - 0.5).abs() < 1e-12);
    assert!((horizon_confidence(Some(0.01), 0, 0.97) - 0.05).abs() < 1e-12);
}

#[test]
fn constant_decline_velocity_and_twin_divergence() {
    let history = linear_history(6, -0.1);
    let prediction = run(&history, Some(Condition::Alzheimer), None, 12);
    assert_eq!(prediction.model, "cascade");
    assert!((prediction.velocity.composite + 0.1).abs() < 1e-9);
    for v in prediction.velocity.domains.values() {
        assert!((v + 0.1).abs() < 1e-9);
    }

    let main = &prediction.predictions;
    let twin = &prediction.twin;
    assert!((main[0].composite - (-0.6)).abs() < 1e-9);
    assert!((main[11].composite - (-1.7)).abs() < 1e-9);
    assert_eq!(prediction.final_alert(), Some(AlertLevel::Red));
    let gap_first = (main[0].composite - twin[0].composite).abs();
    let gap_last = (main[11].composite - twin[11].composite).abs();
    assert!(gap_last > gap_first);
    assert!(twin[11].composite > -0.55);
}

#[test]
fn cascade_stage_accelerates() {
    let history = linear_history(6, -0.1);
    let early = run(&history, Some(Condition::Alzheimer), Some(0), 4);
    let late = run(&history, Some(Condition::Alzheimer), Some(3), 4);
    assert!(late.predictions[3].composite < early.predictions[3].composite);
    // recruited domains decline faster than unrecruited ones
    let week = &late.predictions[3].domains;
    assert!(week[&Domain::Lexical] < week[&Domain::Affective]);
}

#[test]
fn depression_recovers_without_overshoot() {
    let history = linear_history(4, -0.15);
    let prediction = run(&history, Some(Condition::Depression), None, 40);
    assert_eq!(prediction.model, "episodic_recovery");
    let composites: Vec<f64> = prediction.predictions.iter().map(|p| p.composite).collect();
    assert!(composites.windows(2).all(|w| w[1] >= w[0]));
    assert!(composites.iter().all(|c| *c <= 0.0));
    assert!(composites.last().unwrap().abs() < 1e-9);
}

#[test]
fn medication_recovers_within_window() {
    let history = linear_history(4, -0.2);
    let prediction = run(&history, Some(Condition::Medication), None, 6);
    assert_eq!(prediction.model, "time_boxed_recovery");
    let start = -0.6;
    assert!((prediction.predictions[0].composite - start * 2.0 / 3.0).abs() < 1e-9);
    for p in &prediction.predictions[2..] {
        assert!(p.composite.abs() < 1e-12);
        assert!(p.domains.values().all(|v| v.abs() < 1e-12));
    }
}

#[test]
fn motor_models_lead_with_acoustic() {
    let history = linear_history(4, 0.0);
    let pd = run(&history, Some(Condition::Parkinson), None, 8);
    assert_eq!(pd.model, "motor_dominant_pd");
    let last = &pd.predictions[7].domains;
    assert!(last[&Domain::Acoustic] < last[&Domain::Semantic]);
    assert!((last[&Domain::Acoustic] - 8.0 * -0.02).abs() < 1e-9);

    let msa = run(&history, Some(Condition::Msa), None, 8);
    let steps: Vec<f64> = msa
        .predictions
        .windows(2)
        .map(|w| w[1].domains[&Domain::Motor] - w[0].domains[&Domain::Motor])
        .collect();
    assert!(steps.windows(2).all(|s| s[1] < s[0]));

    let psp = run(&history, Some(Condition::Psp), None, 8);
    assert_eq!(psp.model, "motor_dominant_psp");
}

#[test]
fn unknown_primary_uses_aging() {
    let history = linear_history(4, 0.0);
    let none = run(&history, None, None, 4);
    assert_eq!(none.model, "normal_aging");
    assert_eq!(none.predictions, none.twin);
    let aging = run(&history, Some(Condition::NormalAging), None, 4);
    assert_eq!(aging.predictions, aging.twin);
}

#[test]
fn partial_domains_are_projected_only_when_observed() {
    let mut history = linear_history(4, -0.1);
    for point in &mut history {
        point.domain_scores.insert(Domain::Motor, None);
    }
    let prediction = run(&history, Some(Condition::Alzheimer), None, 3);
    assert!(!prediction.predictions[0].domains.contains_key(&Domain::Motor));
    assert!(!prediction.velocity.domains.contains_key(&Domain::Motor));
}

fn profile_history(declining: &[(Domain, f64)]) -> Vec<HistoryPoint> {
    (0..8)
        .map(|w| {
            let mut scores: DomainScores = Domain::ALL.iter().map(|d| (*d, Some(0.0))).collect();
            for (domain, rate) in declining {
                scores.insert(*domain, Some(rate * w as f64));
            }
            HistoryPoint {
                composite: 0.0,
                domain_scores: scores,
            }
        })
        .collect()
}

#[test]
fn language_led_profile_predicts_semantic_next() {
    let catalog = Catalog::builtin().unwrap();
    let history = profile_history(&[(Domain::Lexical, -0.05), (Domain::Syntactic, -0.01)]);
    let profile = decline_profile(&history, 8, &catalog);
    assert_eq!(profile.profile, ProfileType::CascadeLike);
    assert_eq!(profile.leading_edge, Some(Domain::Lexical));
    assert_eq!(profile.predicted_next, Some(Domain::Semantic));
    assert!((profile.domain_velocities[&Domain::Lexical] + 0.05).abs() < 1e-9);
}

#[test]
fn motor_led_profile() {
    let catalog = Catalog::builtin().unwrap();
    let history = profile_history(&[(Domain::Acoustic, -0.04)]);
    let profile = decline_profile(&history, 8, &catalog);
    assert_eq!(profile.profile, ProfileType::MotorLike);
    assert_eq!(profile.predicted_next, Some(Domain::Motor));
}

#[test]
fn affective_and_uniform_profiles() {
    let catalog = Catalog::builtin().unwrap();
    let affective = decline_profile(&profile_history(&[(Domain::Affective, -0.03)]), 8, &catalog);
    assert_eq!(affective.profile, ProfileType::AffectiveLed);
    assert_eq!(affective.predicted_next, Some(Domain::Temporal));

    let memory = decline_profile(&profile_history(&[(Domain::Memory, -0.03)]), 8, &catalog);
    assert_eq!(memory.profile, ProfileType::Uniform);
    assert_eq!(memory.leading_edge, Some(Domain::Memory));
}

#[test]
fn flat_or_short_history_is_stable() {
    let catalog = Catalog::builtin().unwrap();
    let flat = decline_profile(&profile_history(&[]), 8, &catalog);
    assert_eq!(flat.profile, ProfileType::Stable);
    assert_eq!(flat.leading_edge, None);
    assert_eq!(flat.domain_velocities.len(), 9);

    let short = decline_profile(&profile_history(&[(Domain::Lexical, -0.1)])[..3], 8, &catalog);
    assert_eq!(short.profile, ProfileType::Stable);
    assert!(short.domain_velocities.is_empty());

    let barely = decline_profile(&profile_history(&[(Domain::Lexical, -0.004)]), 8, &catalog);
    assert_eq!(barely.profile, ProfileType::Stable);
}
