use anyhow::{Result, bail};

use crate::schema::v1::ReportV1;
use crate::scores::weekly::WeekStatus;
use crate::trajectory::TrajectoryStatus;

pub fn format_summary(report: &ReportV1) -> Result<String> {
    let week = &report.week;
    if !week.composite.is_finite() {
        bail!("non-finite composite in week {}", week.week);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{} v{} (catalog {})\n",
        report.tool, report.version, report.catalog_version
    ));

    if week.status == WeekStatus::NoSessions {
        out.push_str(&format!("Week {}: no scored sessions\n", week.week));
        return Ok(out);
    }

    out.push_str(&format!(
        "Week {}: {} sessions, composite {:+.2}, alert={}\n",
        week.week,
        week.sessions_analyzed,
        week.composite,
        week.alert.as_str()
    ));

    if week.cascades.is_empty() {
        out.push_str("Cascades: none\n");
    } else {
        let names: Vec<String> = week
            .cascades
            .all
            .iter()
            .map(|c| format!("{} stage {} ({})", c.condition, c.stage, c.name))
            .collect();
        out.push_str(&format!("Cascades: {}\n", names.join(", ")));
    }

    if let Some(d) = &report.differential {
        out.push_str(&format!(
            "Differential: {} {:.0}%, then {} {:.0}% (confidence {:.2})\n",
            d.primary,
            d.probability(d.primary) * 100.0,
            d.secondary,
            d.probability(d.secondary) * 100.0,
            d.confidence
        ));
        if d.flags.is_empty() {
            out.push_str("Flags: none\n");
        } else {
            out.push_str(&format!("Flags: {}\n", d.flags.join(", ")));
        }
    }

    if let Some(t) = &report.trajectory {
        match (t.status, t.final_alert()) {
            (TrajectoryStatus::Predicted, Some(alert)) => out.push_str(&format!(
                "Trajectory: {} over {} weeks -> {} (confidence {:.2})\n",
                t.model,
                t.horizon_weeks,
                alert.as_str(),
                t.confidence
            )),
            _ => out.push_str("Trajectory: insufficient data\n"),
        }
    }

    Ok(out)
}
