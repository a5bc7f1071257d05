use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Confounder;

/// Indicator id to measured value; `None` means not measured this session.
pub type FeatureVector = BTreeMap<String, Option<f64>>;

/// Active confounder flags for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Confounders {
    pub illness: bool,
    pub poor_sleep: bool,
    pub medication_change: bool,
    pub emotional_distress: bool,
}

impl Confounders {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_active(&self, confounder: Confounder) -> bool {
        match confounder {
            Confounder::Illness => self.illness,
            Confounder::PoorSleep => self.poor_sleep,
            Confounder::MedicationChange => self.medication_change,
            Confounder::EmotionalDistress => self.emotional_distress,
        }
    }

    pub fn active(&self) -> Vec<Confounder> {
        Confounder::ALL
            .into_iter()
            .filter(|c| self.is_active(*c))
            .collect()
    }

    pub fn any(&self) -> bool {
        self.illness || self.poor_sleep || self.medication_change || self.emotional_distress
    }
}

/// One session as delivered by the feature extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInput {
    pub values: FeatureVector,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub confounders: Confounders,
}

impl SessionInput {
    pub fn new(values: FeatureVector) -> Self {
        Self {
            values,
            language: "en".to_string(),
            confounders: Confounders::none(),
        }
    }

    pub fn with_confounders(mut self, confounders: Confounders) -> Self {
        self.confounders = confounders;
        self
    }

    pub fn value(&self, id: &str) -> Option<f64> {
        read_value(&self.values, id)
    }
}

/// Reads an indicator value clamped to [0, 1]; NaN and missing read as `None`.
pub fn read_value(values: &FeatureVector, id: &str) -> Option<f64> {
    let v = values.get(id).copied().flatten()?;
    if v.is_nan() {
        return None;
    }
    Some(v.clamp(0.0, 1.0))
}
