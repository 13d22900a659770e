//! `status` output.

use super::shared::{format_bytes, format_section_heading, to_json};
use crate::error::SyncError;
use crate::orchestrator::ScopeStatus;
use crate::reconcile::{Classification, DiffSummary};
use crate::tree::Entry;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn styled_label(classification: Classification) -> String {
    let label = classification.label();
    match classification {
        Classification::InSync => format!("{}", label.green()),
        Classification::LocalOnly | Classification::LocalNewer => format!("{}", label.cyan()),
        Classification::RemoteOnly | Classification::RemoteNewer => format!("{}", label.blue()),
        Classification::Diverged => format!("{}", label.yellow()),
    }
}

fn side(entry: Option<&Entry>) -> String {
    match entry {
        Some(entry) => {
            let size = format_bytes(entry.size);
            match entry.modified_at {
                Some(at) => format!("{}, {}", size, at.format("%Y-%m-%d %H:%M:%S")),
                None => size,
            }
        }
        None => "-".to_string(),
    }
}

fn summary_line(summary: &DiffSummary) -> String {
    format!(
        "{} in sync, {} local only, {} remote only, {} local newer, {} remote newer, {} diverged",
        summary.in_sync,
        summary.local_only,
        summary.remote_only,
        summary.local_newer,
        summary.remote_newer,
        summary.diverged
    )
}

/// Text report; in-sync paths are listed only with `all_entries`.
pub fn format_status_text(scopes: &[ScopeStatus], all_entries: bool) -> String {
    if scopes.is_empty() {
        return "No projects matched.".to_string();
    }
    let mut out = String::new();
    for scope in scopes {
        out.push_str(&format!("{}\n", format_section_heading(&scope.project.to_string())));
        if let Some(ref error) = scope.error {
            out.push_str(&format!("  {} {}\n\n", "error:".red(), error));
            continue;
        }
        if let Some(ref note) = scope.note {
            out.push_str(&format!("  {}\n", note));
        }
        if scope.summary.is_clean() {
            out.push_str(&format!(
                "  {} ({} files)\n\n",
                "Up to date".green(),
                scope.summary.in_sync
            ));
            if !all_entries {
                continue;
            }
        } else {
            out.push_str(&format!("  {}\n", summary_line(&scope.summary)));
        }

        let rows: Vec<_> = scope
            .entries
            .iter()
            .filter(|e| all_entries || e.classification != Classification::InSync)
            .collect();
        if rows.is_empty() {
            out.push('\n');
            continue;
        }
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Path", "State", "Local", "Cloud"]);
        for entry in rows {
            table.add_row(vec![
                entry.path.clone(),
                styled_label(entry.classification),
                side(entry.local.as_ref()),
                side(entry.remote.as_ref()),
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }
    out.trim_end().to_string()
}

pub fn format_status_json(scopes: &[ScopeStatus], all_entries: bool) -> Result<String, SyncError> {
    if all_entries {
        return to_json(&serde_json::json!({ "scopes": scopes }));
    }
    let trimmed: Vec<ScopeStatus> = scopes
        .iter()
        .cloned()
        .map(|mut scope| {
            scope
                .entries
                .retain(|e| e.classification != Classification::InSync);
            scope
        })
        .collect();
    to_json(&serde_json::json!({ "scopes": trimmed }))
}
