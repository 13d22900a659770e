//! `save` / `load` output, including dry-run plans.

use super::shared::{format_bytes, format_section_heading, to_json};
use crate::error::SyncError;
use crate::orchestrator::{ScopeOutcome, ScopeTransfer};
use crate::transfer::{TransferPlan, TransferReport};
use crate::types::Direction;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn verb(direction: Direction) -> &'static str {
    match direction {
        Direction::Save => "uploaded",
        Direction::Load => "downloaded",
    }
}

fn report_text(report: &TransferReport, direction: Direction) -> String {
    let moved = match direction {
        Direction::Save => report.uploaded,
        Direction::Load => report.downloaded,
    };
    let mut out = format!(
        "  {} {}, {} unchanged",
        moved,
        verb(direction),
        report.skipped
    );
    if report.failed > 0 {
        out.push_str(&format!(", {}", format!("{} failed", report.failed).red()));
    }
    if report.cancelled > 0 {
        out.push_str(&format!(", {}", format!("{} cancelled", report.cancelled).yellow()));
    }
    out.push('\n');
    if !report.failures.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Failed path", "Attempts", "Reason"]);
        for failure in &report.failures {
            table.add_row(vec![
                failure.path.clone(),
                failure.attempts.to_string(),
                failure.reason.clone(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }
    out
}

fn plan_text(plan: &TransferPlan) -> String {
    if plan.is_empty() {
        return format!("  Nothing to do ({} unchanged)\n", plan.skipped);
    }
    let mut out = format!(
        "  Would transfer {} files ({}), {} unchanged\n",
        plan.transfers.len(),
        format_bytes(plan.total_bytes()),
        plan.skipped
    );
    for dir in &plan.directories {
        out.push_str(&format!("  mkdir  {}\n", dir));
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "State", "Size"]);
    for transfer in &plan.transfers {
        table.add_row(vec![
            transfer.path.clone(),
            transfer.classification.label().to_string(),
            format_bytes(transfer.bytes),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_transfers_text(scopes: &[ScopeTransfer]) -> String {
    if scopes.is_empty() {
        return "No projects matched.".to_string();
    }
    let mut out = String::new();
    for scope in scopes {
        out.push_str(&format!(
            "{} [{}]\n",
            format_section_heading(&scope.project.to_string()),
            scope.direction
        ));
        match &scope.outcome {
            ScopeOutcome::Completed { report } => out.push_str(&report_text(report, scope.direction)),
            ScopeOutcome::Planned { plan } => out.push_str(&plan_text(plan)),
            ScopeOutcome::Skipped { reason } => {
                out.push_str(&format!("  {} {}\n", "skipped:".dimmed(), reason))
            }
            ScopeOutcome::Cancelled => out.push_str(&format!("  {}\n", "cancelled".yellow())),
            ScopeOutcome::Failed { reason } => {
                out.push_str(&format!("  {} {}\n", "failed:".red(), reason))
            }
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn format_transfers_json(scopes: &[ScopeTransfer]) -> Result<String, SyncError> {
    to_json(&serde_json::json!({ "scopes": scopes }))
}
