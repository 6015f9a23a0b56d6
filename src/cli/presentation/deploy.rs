//! Deploy report presentation.

use crate::cli::presentation::comparison::{format_counts, format_patterns_text};
use crate::cli::presentation::shared::format_section_heading;
use crate::deploy::DeployReport;
use crate::error::ApiError;
use crate::invalidation::{BatchOutcome, InvalidationReport};
use crate::sync::{PathOutcome, SyncOperation, SyncReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn operation_label(operation: SyncOperation) -> &'static str {
    match operation {
        SyncOperation::Put => "put",
        SyncOperation::Delete => "delete",
    }
}

fn format_sync_section(sync: &SyncReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Store Sync")));
    out.push_str(&format!(
        "  Succeeded: {}  Failed: {}  Skipped: {}  ({} ms)\n",
        sync.succeeded().count(),
        sync.failed().count(),
        sync.skipped().count(),
        sync.duration_ms
    ));

    let problems: Vec<_> = sync
        .results
        .iter()
        .filter(|r| r.outcome != PathOutcome::Succeeded)
        .collect();
    if problems.is_empty() {
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Operation", "Path", "Outcome"]);
    for result in problems {
        let outcome = match &result.outcome {
            PathOutcome::Failed { reason } => format!("failed: {}", reason),
            PathOutcome::Skipped => "skipped".to_string(),
            PathOutcome::Succeeded => "ok".to_string(),
        };
        table.add_row(vec![
            operation_label(result.operation).to_string(),
            result.path.clone(),
            outcome,
        ]);
    }
    out.push('\n');
    out.push_str(&table.to_string());
    out.push('\n');
    out
}

fn format_invalidation_section(report: &InvalidationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("CDN {}", report.cdn))
    ));
    if report.batches.is_empty() {
        out.push_str("  Nothing submitted.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Batch", "Patterns", "Outcome"]);
    for (index, batch) in report.batches.iter().enumerate() {
        let outcome = match &batch.outcome {
            BatchOutcome::Submitted { reference_id } => format!("submitted: {}", reference_id),
            BatchOutcome::Partial {
                reference_id,
                reason,
            } => format!("partial: {} ({})", reference_id, reason),
            BatchOutcome::Failed { reason } => format!("failed: {}", reason),
            BatchOutcome::Skipped => "skipped".to_string(),
        };
        table.add_row(vec![
            (index + 1).to_string(),
            batch.patterns.len().to_string(),
            outcome,
        ]);
    }
    out.push_str(&table.to_string());
    out.push('\n');
    out
}

pub fn format_deploy_report_text(report: &DeployReport) -> String {
    let mut out = String::new();
    let title = if report.dry_run {
        "Deploy (dry run)"
    } else {
        "Deploy"
    };
    out.push_str(&format!("{}\n\n", format_section_heading(title)));
    if let Some(started_at) = report.started_at {
        out.push_str(&format!("  Started: {}\n", started_at.to_rfc3339()));
    }
    if let Some(summary) = &report.comparison {
        out.push_str(&format!("  {}\n", format_counts(summary)));
    }
    out.push('\n');
    out.push_str(&format_patterns_text(&report.patterns));

    if !report.dry_run {
        out.push('\n');
        out.push_str(&format_sync_section(&report.sync));
        for invalidation in &report.invalidations {
            out.push('\n');
            out.push_str(&format_invalidation_section(invalidation));
        }
    }

    let status = if report.dry_run {
        format!("{}", "Dry run complete".cyan())
    } else if report.has_failures() {
        format!("{}", "Finished with failures".red())
    } else {
        format!("{}", "Deployed".green())
    };
    out.push_str(&format!("\n{} in {} ms\n", status, report.duration_ms));
    out
}

pub fn format_deploy_report_json(report: &DeployReport) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(report)?)
}
