//! Human-readable summary renderer for drift reports.

use super::DriftReport;

/// Render a plain-text summary of a [`DriftReport`] for console output.
pub fn render_drift_summary(collection: &str, report: &DriftReport) -> String {
    let mut out = format!(
        "Schema drift for '{collection}': {} paths observed, {} new, {} updated",
        report.paths_observed,
        report.new_paths.len(),
        report.updated_paths
    );
    if report.errors > 0 {
        out.push_str(&format!(", {} tag write errors", report.errors));
    }
    out.push('\n');

    if !report.has_drift() {
        out.push_str("  No new fields or type changes detected.\n");
        return out;
    }

    for path in &report.new_paths {
        out.push_str(&format!("  + {path}\n"));
    }
    for change in &report.type_changes {
        out.push_str(&format!("  ~ {}: {} -> {}\n", change.path, change.from, change.to));
    }
    out
}
