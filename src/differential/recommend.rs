use std::collections::BTreeMap;

use crate::catalog::Condition;
use crate::scores::AlertLevel;

const CLOSE_CALL: f64 = 0.6;
const SETTLED: f64 = 0.5;

/// Advisory text, most urgent first.
pub fn recommend(
    primary: Condition,
    secondary: Condition,
    confidence: f64,
    evidence: &BTreeMap<Condition, Vec<String>>,
    alert: AlertLevel,
) -> Vec<String> {
    let mut recs = Vec::new();

    match alert {
        AlertLevel::Red => recs.push("Urgent referral: drift has reached the red tier.".to_string()),
        AlertLevel::Orange => {
            recs.push("Suggest clinical follow-up within two weeks.".to_string())
        }
        AlertLevel::Yellow | AlertLevel::Green => {}
    }

    match primary {
        Condition::NormalAging => {
            if confidence > SETTLED {
                recs.push("Continue standard monitoring. No concerns at this time.".to_string());
            } else {
                recs.push("Continue routine monitoring and re-evaluate next week.".to_string());
            }
        }
        Condition::Alzheimer => {
            recs.push(
                "Pattern consistent with early cognitive decline. Recommend cognitive screening."
                    .to_string(),
            );
            if confidence < CLOSE_CALL {
                recs.push(format!(
                    "Also consider {} (close probability). Monitor 2 more weeks.",
                    secondary
                ));
            }
        }
        Condition::Depression => {
            recs.push(
                "Pattern suggests depression rather than cognitive decline. Recommend mood screening."
                    .to_string(),
            );
            recs.push(
                "Do not escalate to a dementia-specific referral until depression is ruled out."
                    .to_string(),
            );
        }
        Condition::Parkinson => {
            recs.push(
                "Motor speech involvement suggested. Recommend neurological evaluation.".to_string(),
            );
            if matches!(secondary, Condition::Msa | Condition::Psp) {
                recs.push(format!(
                    "Atypical parkinsonism ({}) features present. Consider DaTscan and specialist referral.",
                    secondary.as_str().to_uppercase()
                ));
            }
        }
        Condition::Medication => {
            recs.push("Changes correlate with medication timing. Recommend pharmacist review.".to_string());
            recs.push(
                "Defer cognitive concern until the medication adjustment period (2-3 weeks) has passed."
                    .to_string(),
            );
        }
        Condition::Grief => {
            recs.push("Changes appear event-linked. Monitor for recovery over 4-8 weeks.".to_string());
            recs.push("If patterns persist beyond 3 months, consider depression screening.".to_string());
        }
        Condition::Msa => {
            recs.push(
                "Vocal tremor and articulatory pattern suggest multiple system atrophy.".to_string(),
            );
            recs.push(
                "Recommend DaTscan, autonomic function testing and movement disorder specialist referral."
                    .to_string(),
            );
        }
        Condition::Psp => {
            recs.push(
                "Repetitions with articulatory decay suggest progressive supranuclear palsy."
                    .to_string(),
            );
            recs.push(
                "Recommend MRI, oculomotor examination and movement disorder specialist referral."
                    .to_string(),
            );
        }
    }

    let has = |c: Condition| evidence.get(&c).is_some_and(|e| !e.is_empty());
    let advisory_applies = !matches!(
        primary,
        Condition::NormalAging | Condition::Medication | Condition::Grief
    );
    if advisory_applies && has(Condition::Parkinson) && has(Condition::Depression) {
        recs.push(
            "Both motor speech and affective markers present. Consider comorbid PD and depression."
                .to_string(),
        );
    }

    recs
}
