use crate::catalog::{Condition, Domain};
use crate::differential::Masses;
use crate::differential::temporal::TemporalPattern;
use crate::input::Confounders;
use crate::scores::{CascadeMatches, DomainScores, ZScores};

/// Read-only view handed to every rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub domain_scores: &'a DomainScores,
    pub z_scores: &'a ZScores,
    pub cascades: &'a CascadeMatches,
    pub confounder_history: &'a [Confounders],
    pub pattern: &'a TemporalPattern,
    pub timeline_len: usize,
    pub min_timeline_points: usize,
}

impl RuleInput<'_> {
    pub fn z(&self, id: &str) -> Option<f64> {
        self.z_scores.get(id).copied().flatten()
    }

    pub fn domain(&self, domain: Domain) -> Option<f64> {
        self.domain_scores.get(&domain).copied().flatten()
    }

    fn z_below(&self, id: &str, threshold: f64) -> bool {
        self.z(id).is_some_and(|v| v < threshold)
    }

    fn domain_below(&self, domain: Domain, threshold: f64) -> bool {
        self.domain(domain).is_some_and(|v| v < threshold)
    }

    fn domain_above(&self, domain: Domain, threshold: f64) -> bool {
        self.domain(domain).is_some_and(|v| v > threshold)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub condition: Condition,
    pub mass: f64,
    pub evidence: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub contributions: Vec<Contribution>,
    pub flags: Vec<&'static str>,
}

impl RuleOutcome {
    pub fn one(condition: Condition, mass: f64, evidence: impl Into<String>) -> Self {
        Self::default().with(condition, mass, evidence)
    }

    pub fn with(mut self, condition: Condition, mass: f64, evidence: impl Into<String>) -> Self {
        self.contributions.push(Contribution {
            condition,
            mass,
            evidence: evidence.into(),
        });
        self
    }

    pub fn flag(mut self, flag: &'static str) -> Self {
        self.flags.push(flag);
        self
    }
}

/// A declarative differential rule: a pure function of the inputs and the
/// masses accumulated by earlier rules.
pub struct Rule {
    pub id: &'static str,
    pub evaluate: fn(&RuleInput<'_>, &Masses) -> Option<RuleOutcome>,
}

pub const RULES: &[Rule] = &[
    Rule { id: "ad_cascade", evaluate: ad_cascade },
    Rule { id: "referential_coherence", evaluate: referential_coherence },
    Rule { id: "cued_recall", evaluate: cued_recall },
    Rule { id: "self_pronouns", evaluate: self_pronouns },
    Rule { id: "negative_valence", evaluate: negative_valence },
    Rule { id: "temporal_pattern", evaluate: temporal_pattern },
    Rule { id: "idea_density", evaluate: idea_density },
    Rule { id: "within_clause_pauses", evaluate: within_clause_pauses },
    Rule { id: "fluency_language_split", evaluate: fluency_language_split },
    Rule { id: "anhedonia", evaluate: anhedonia },
    Rule { id: "medication_change", evaluate: medication_change },
    Rule { id: "emotional_distress", evaluate: emotional_distress },
    Rule { id: "global_stability", evaluate: global_stability },
    Rule { id: "self_correction", evaluate: self_correction },
    Rule { id: "pd_acoustic_quartet", evaluate: pd_acoustic_quartet },
    Rule { id: "pd_articulatory", evaluate: pd_articulatory },
    Rule { id: "msa_tremor", evaluate: msa_tremor },
    Rule { id: "psp_repetition", evaluate: psp_repetition },
    Rule { id: "mdd_latency", evaluate: mdd_latency },
    Rule { id: "acoustic_depression", evaluate: acoustic_depression },
    Rule { id: "ruminative_language", evaluate: ruminative_language },
    Rule { id: "verbal_output", evaluate: verbal_output },
    Rule { id: "prodromal_monopitch", evaluate: prodromal_monopitch },
    Rule { id: "confounded_window", evaluate: confounded_window },
];

const ORDER_PRESERVED_CONFIDENCE: f64 = 0.8;
const ORDER_BROKEN_CONFIDENCE: f64 = 0.4;

fn ad_cascade(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let detection = input.cascades.get(Condition::Alzheimer)?;
    if detection.stage < 1 {
        return None;
    }
    let sem = input.domain(Domain::Semantic).unwrap_or(0.0);
    let syn = input.domain(Domain::Syntactic).unwrap_or(0.0);
    let order_preserved = sem.abs() >= syn.abs() * 0.8;
    let confidence = if order_preserved {
        ORDER_PRESERVED_CONFIDENCE
    } else {
        ORDER_BROKEN_CONFIDENCE
    };
    Some(RuleOutcome::one(
        Condition::Alzheimer,
        0.25 * confidence,
        format!(
            "Language-first cascade at stage {} ({}), order {}",
            detection.stage,
            detection.name,
            if order_preserved { "preserved" } else { "not preserved" }
        ),
    ))
}

fn referential_coherence(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let z = input.z("SEM_REF_COHERENCE")?;
    if z < -0.5 {
        Some(RuleOutcome::one(
            Condition::Alzheimer,
            0.20,
            format!("Referential coherence degraded (z={:.2})", z),
        ))
    } else if z > -0.2 {
        Some(
            RuleOutcome::one(
                Condition::Depression,
                0.15,
                format!("Referential coherence preserved (z={:.2}), argues against AD", z),
            )
            .with(Condition::NormalAging, 0.10, "Referential coherence preserved"),
        )
    } else {
        None
    }
}

fn cued_recall(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let cued = input.z("MEM_CUED_RECALL")?;
    let free = input.z("MEM_FREE_RECALL")?;
    if free >= -0.5 {
        return None;
    }
    let benefit = cued - free;
    if benefit > 0.3 {
        Some(RuleOutcome::one(
            Condition::Depression,
            0.20,
            format!("Cues restore recall (benefit={:.2}), retrieval deficit", benefit),
        ))
    } else if benefit < 0.15 {
        Some(RuleOutcome::one(
            Condition::Alzheimer,
            0.20,
            format!("Cues do not restore recall (benefit={:.2}), storage deficit", benefit),
        ))
    } else {
        None
    }
}

fn self_pronouns(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let z = input.z("AFF_SELF_PRONOUN").filter(|z| *z < -0.5)?;
    Some(RuleOutcome::one(
        Condition::Depression,
        0.15,
        format!("Self-referential pronoun use shifted (z={:.2})", z),
    ))
}

fn negative_valence(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let z = input.z("AFF_NEG_VALENCE").filter(|z| *z < -0.4)?;
    Some(RuleOutcome::one(
        Condition::Depression,
        0.15,
        format!("Negative valence language elevated (z={:.2})", z),
    ))
}

fn temporal_pattern(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    if input.timeline_len < input.min_timeline_points {
        return None;
    }
    match input.pattern {
        TemporalPattern::MonotonicDecline { points, .. } => Some(RuleOutcome::one(
            Condition::Alzheimer,
            0.15,
            format!("Monotonic decline over {} weeks", points),
        )),
        TemporalPattern::Episodic { oscillations } => Some(RuleOutcome::one(
            Condition::Depression,
            0.20,
            format!("Episodic fluctuation ({} reversals)", oscillations),
        )),
        TemporalPattern::AcuteDrop { at, magnitude } => Some(RuleOutcome::one(
            Condition::Medication,
            0.25,
            format!("Acute drop of {:.2} at week {}", magnitude, at),
        )),
        TemporalPattern::Stable { .. } => Some(RuleOutcome::one(
            Condition::NormalAging,
            0.25,
            "Stable composite history",
        )),
        TemporalPattern::Unclear | TemporalPattern::InsufficientData => None,
    }
}

fn idea_density(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let z = input.z("SEM_IDEA_DENSITY").filter(|z| *z < -0.5)?;
    Some(RuleOutcome::one(
        Condition::Alzheimer,
        0.15,
        format!("Idea density declining (z={:.2})", z),
    ))
}

fn within_clause_pauses(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let z = input.z("TMP_WITHIN_CLAUSE").filter(|z| *z < -0.5)?;
    Some(RuleOutcome::one(
        Condition::Alzheimer,
        0.10,
        format!("Within-clause pauses elevated (z={:.2}), word-finding difficulty", z),
    ))
}

fn fluency_language_split(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let mut outcome = RuleOutcome::default();
    if input.domain_below(Domain::Temporal, -0.5)
        && input.domain_above(Domain::Semantic, -0.2)
        && input.domain_above(Domain::Lexical, -0.2)
    {
        outcome = outcome.with(
            Condition::Parkinson,
            0.20,
            "Fluency-dominant decline with preserved language",
        );
    }
    if input.domain_below(Domain::Semantic, -0.5)
        && input.domain_below(Domain::Lexical, -0.5)
        && input.domain_above(Domain::Temporal, -0.3)
    {
        outcome = outcome.with(
            Condition::Alzheimer,
            0.10,
            "Semantic and lexical decline with preserved fluency",
        );
    }
    if outcome.contributions.is_empty() {
        None
    } else {
        Some(outcome)
    }
}

fn anhedonia(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let mut outcome = RuleOutcome::default();
    if input.z_below("AFF_HEDONIC", -0.4) {
        outcome = outcome.with(Condition::Depression, 0.10, "Reduced hedonic language");
    }
    if input.z_below("AFF_ENGAGEMENT", -0.4) {
        outcome = outcome.with(Condition::Depression, 0.10, "Reduced conversational engagement");
    }
    if outcome.contributions.is_empty() {
        None
    } else {
        Some(outcome)
    }
}

fn medication_change(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    if !input.confounder_history.iter().any(|c| c.medication_change) {
        return None;
    }
    Some(RuleOutcome::one(
        Condition::Medication,
        0.20,
        "Medication change reported in recent sessions",
    ))
}

fn emotional_distress(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    if !input.confounder_history.iter().any(|c| c.emotional_distress) {
        return None;
    }
    Some(RuleOutcome::one(
        Condition::Grief,
        0.15,
        "Emotional distress reported",
    ))
}

fn global_stability(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let all_within = input
        .domain_scores
        .values()
        .all(|v| v.is_none_or(|v| v > -0.3));
    if !all_within {
        return None;
    }
    Some(RuleOutcome::one(
        Condition::NormalAging,
        0.30,
        "All domains within normal range",
    ))
}

fn self_correction(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let z = input.z("DIS_SELF_CORRECTION")?;
    if z < -0.5 {
        Some(RuleOutcome::one(
            Condition::Alzheimer,
            0.10,
            format!("Self-correction declining (z={:.2})", z),
        ))
    } else {
        Some(
            RuleOutcome::one(Condition::Depression, 0.05, "Self-correction preserved")
                .with(Condition::NormalAging, 0.05, "Self-correction preserved"),
        )
    }
}

fn acoustic_quartet(input: &RuleInput<'_>) -> bool {
    input.z_below("PDM_PPE", -0.5) && input.z_below("PDM_RPDE", -0.5) && input.z_below("ACU_HNR", -0.5)
}

fn articulatory_involved(input: &RuleInput<'_>) -> bool {
    input.z_below("PDM_VSA", -0.5) || input.z_below("PDM_DDK_RATE", -0.5)
}

fn pd_acoustic_quartet(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    if !acoustic_quartet(input) {
        return None;
    }
    Some(RuleOutcome::one(
        Condition::Parkinson,
        0.30,
        format!(
            "PD acoustic signature (PPE z={:.2}, RPDE z={:.2}, HNR z={:.2})",
            input.z("PDM_PPE").unwrap_or(0.0),
            input.z("PDM_RPDE").unwrap_or(0.0),
            input.z("ACU_HNR").unwrap_or(0.0)
        ),
    ))
}

fn pd_articulatory(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    if !articulatory_involved(input) {
        return None;
    }
    let mut parts = Vec::new();
    if let Some(z) = input.z("PDM_VSA").filter(|z| *z < -0.5) {
        parts.push(format!("VSA z={:.2}", z));
    }
    if let Some(z) = input.z("PDM_DDK_RATE").filter(|z| *z < -0.5) {
        parts.push(format!("DDK rate z={:.2}", z));
    }
    Some(RuleOutcome::one(
        Condition::Parkinson,
        0.15,
        format!("Articulatory involvement ({})", parts.join(", ")),
    ))
}

fn msa_tremor(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let f0_sd = input.z("ACU_F0_SD").filter(|z| *z > 0.3)?;
    let shimmer = input.z("ACU_SHIMMER").filter(|z| *z < -0.5)?;
    let ddk_reg = input.z("PDM_DDK_REG").filter(|z| *z < -0.8)?;
    if !acoustic_quartet(input) {
        return None;
    }
    let evidence = format!(
        "Pitch instability with vocal tremor (F0 SD z={:.2}, shimmer z={:.2}, DDK regularity z={:.2})",
        f0_sd, shimmer, ddk_reg
    );
    Some(
        RuleOutcome::one(Condition::Msa, 0.20, evidence)
            .with(Condition::Parkinson, -0.10, "Tremor pattern favours MSA over PD"),
    )
}

fn psp_repetition(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let repetition = input.z("TMP_REPETITION").filter(|z| *z < -0.8)?;
    let ddk_reg = input.z("PDM_DDK_REG").filter(|z| *z < -0.8)?;
    if !(acoustic_quartet(input) && articulatory_involved(input)) {
        return None;
    }
    Some(RuleOutcome::one(
        Condition::Psp,
        0.15,
        format!(
            "Stuttering-like repetition with articulatory decay (repetition z={:.2}, DDK regularity z={:.2})",
            repetition, ddk_reg
        ),
    ))
}

fn mdd_latency(input: &RuleInput<'_>, masses: &Masses) -> Option<RuleOutcome> {
    let depression = masses.get(&Condition::Depression).copied().unwrap_or(0.0);
    if depression <= 0.20 {
        return None;
    }
    let latency = input.z("TMP_RESPONSE_LATENCY").filter(|z| *z < -1.0)?;
    Some(
        RuleOutcome::one(
            Condition::Depression,
            0.0,
            format!("Response latency strongly elevated (z={:.2}), unipolar pattern", latency),
        )
        .flag("mdd_vs_bipolar_noted"),
    )
}

fn acoustic_depression(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let mfcc2 = input.z("ACU_MFCC2").filter(|z| *z < -0.5)?;
    let harm = input.z("ACU_SPECTRAL_HARM").filter(|z| *z < -0.5)?;
    Some(RuleOutcome::one(
        Condition::Depression,
        0.15,
        format!(
            "Acoustic depression markers (MFCC-2 z={:.2}, spectral harmonicity z={:.2})",
            mfcc2, harm
        ),
    ))
}

fn ruminative_language(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let death = input.z("LEX_DEATH_WORDS").filter(|z| *z < -0.4)?;
    let ruminative = input.z("LEX_RUMINATIVE").filter(|z| *z < -0.4)?;
    Some(RuleOutcome::one(
        Condition::Depression,
        0.10,
        format!(
            "Death-related and ruminative language elevated (z={:.2}, z={:.2})",
            death, ruminative
        ),
    ))
}

fn verbal_output(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let z = input.z("LEX_VERBAL_OUTPUT").filter(|z| *z < -0.5)?;
    let evidence = format!("Verbal output reduced (z={:.2})", z);
    Some(
        RuleOutcome::one(Condition::Depression, 0.05, evidence.clone())
            .with(Condition::Parkinson, 0.05, evidence),
    )
}

fn prodromal_monopitch(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let z = input.z("PDM_MONOPITCH").filter(|z| *z < -0.4)?;
    let motor = input.domain(Domain::Motor).filter(|m| *m > -0.2)?;
    Some(
        RuleOutcome::one(
            Condition::Parkinson,
            0.10,
            format!(
                "Isolated monopitch (z={:.2}) with near-normal motor domain ({:.2})",
                z, motor
            ),
        )
        .flag("prodromal_pd_rbd_flag"),
    )
}

/// Downweights progressive conditions when most recent sessions were taken
/// while ill or short of sleep.
fn confounded_window(input: &RuleInput<'_>, _: &Masses) -> Option<RuleOutcome> {
    let total = input.confounder_history.len();
    if total == 0 {
        return None;
    }
    let confounded = input
        .confounder_history
        .iter()
        .filter(|c| c.illness || c.poor_sleep)
        .count();
    if confounded * 2 < total {
        return None;
    }
    let evidence = format!("{} of {} recent sessions taken while ill or short of sleep", confounded, total);
    Some(
        RuleOutcome::one(Condition::Alzheimer, -0.10, evidence.clone())
            .with(Condition::Parkinson, -0.05, evidence.clone())
            .with(Condition::NormalAging, 0.05, evidence)
            .flag("confounded_window"),
    )
}
