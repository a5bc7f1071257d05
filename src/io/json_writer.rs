use anyhow::{Context, Result};

use crate::catalog::Catalog;
use crate::ctx::WeeklyReport;
use crate::schema::v1::ReportV1;

pub fn build_report(catalog: &Catalog, weekly: &WeeklyReport) -> ReportV1 {
    ReportV1::new(
        env!("CARGO_PKG_VERSION"),
        catalog.version(),
        weekly.summary.clone(),
        weekly.differential.clone(),
        weekly.trajectory.clone(),
    )
}

pub fn to_json_pretty(report: &ReportV1) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report")
}

pub fn from_json(json: &str) -> Result<ReportV1> {
    let report: ReportV1 = serde_json::from_str(json).context("failed to parse report")?;
    if report.schema_version != crate::schema::v1::SCHEMA_VERSION {
        anyhow::bail!("unsupported report schema {}", report.schema_version);
    }
    Ok(report)
}
