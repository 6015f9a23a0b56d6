//! Comparison and plan presentation.

use crate::cli::presentation::shared::format_section_heading;
use crate::compare::{ChangeKind, ComparisonSummary};
use crate::deploy::DeployPlan;
use crate::error::ApiError;
use crate::invalidation::InvalidationPattern;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::{Cell, Color, Table};
use serde_json::json;

fn kind_cell(kind: ChangeKind) -> Cell {
    match kind {
        ChangeKind::Added => Cell::new("added").fg(Color::Green),
        ChangeKind::Modified => Cell::new("modified").fg(Color::Yellow),
        ChangeKind::Deleted => Cell::new("deleted").fg(Color::Red),
        ChangeKind::Unchanged => Cell::new("unchanged"),
    }
}

/// One-line counts, e.g. `Added: 1  Modified: 0  Deleted: 2  Unchanged: 7`
pub fn format_counts(summary: &ComparisonSummary) -> String {
    format!(
        "Added: {}  Modified: {}  Deleted: {}  Unchanged: {}",
        summary.added_count, summary.modified_count, summary.deleted_count, summary.unchanged_count
    )
}

pub fn format_comparison_text(summary: &ComparisonSummary, include_unchanged: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Comparison")));
    out.push_str(&format!("  {}\n", format_counts(summary)));

    let mut rows: Vec<(ChangeKind, &String)> = Vec::new();
    rows.extend(summary.added.iter().map(|p| (ChangeKind::Added, p)));
    rows.extend(summary.modified.iter().map(|p| (ChangeKind::Modified, p)));
    rows.extend(summary.deleted.iter().map(|p| (ChangeKind::Deleted, p)));
    if include_unchanged {
        rows.extend(summary.unchanged.iter().map(|p| (ChangeKind::Unchanged, p)));
    }
    if rows.is_empty() {
        out.push_str("\n  No changes.\n");
        return out;
    }
    rows.sort_by(|a, b| a.1.cmp(b.1));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Status", "Path"]);
    for (kind, path) in rows {
        table.add_row(vec![kind_cell(kind), Cell::new(path)]);
    }
    out.push('\n');
    out.push_str(&table.to_string());
    out.push('\n');
    out
}

pub fn format_comparison_json(summary: &ComparisonSummary) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn format_patterns_text(patterns: &[InvalidationPattern]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading("Invalidation Patterns")
    ));
    if patterns.is_empty() {
        out.push_str("  None.\n");
        return out;
    }
    for pattern in patterns {
        out.push_str(&format!("  {}\n", pattern));
    }
    out
}

pub fn format_plan_text(plan: &DeployPlan) -> String {
    let summary = plan.comparison.summary();
    format!(
        "{}\n{}",
        format_comparison_text(&summary, false),
        format_patterns_text(&plan.patterns)
    )
}

pub fn format_plan_json(plan: &DeployPlan) -> Result<String, ApiError> {
    let out = json!({
        "comparison": plan.comparison.summary(),
        "patterns": plan.patterns,
    });
    Ok(serde_json::to_string_pretty(&out)?)
}
