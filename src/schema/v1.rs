use serde::{Deserialize, Serialize};

use crate::catalog::Condition;
use crate::differential::DifferentialResult;
use crate::scores::AlertLevel;
use crate::scores::weekly::WeekSummary;
use crate::trajectory::TrajectoryPrediction;

pub const TOOL: &str = "kira-cvf";
pub const SCHEMA_VERSION: &str = "v1";

/// At-a-glance fields for list views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub alert: AlertLevel,
    pub composite: f64,
    pub primary: Option<Condition>,
    pub confidence: Option<f64>,
    pub projected_alert: Option<AlertLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub catalog_version: String,
    pub headline: Headline,
    pub week: WeekSummary,
    pub differential: Option<DifferentialResult>,
    pub trajectory: Option<TrajectoryPrediction>,
}

impl ReportV1 {
    pub fn new(
        tool_version: &str,
        catalog_version: &str,
        week: WeekSummary,
        differential: Option<DifferentialResult>,
        trajectory: Option<TrajectoryPrediction>,
    ) -> Self {
        let headline = Headline {
            alert: week.alert,
            composite: week.composite,
            primary: differential.as_ref().map(|d| d.primary),
            confidence: differential.as_ref().map(|d| d.confidence),
            projected_alert: trajectory.as_ref().and_then(|t| t.final_alert()),
        };
        Self {
            tool: TOOL.to_string(),
            version: tool_version.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            catalog_version: catalog_version.to_string(),
            headline,
            week,
            differential,
            trajectory,
        }
    }
}
