//! `list` output.

use super::shared::{format_section_heading, to_json};
use crate::error::SyncError;
use crate::orchestrator::CategoryListing;
use owo_colors::OwoColorize;

pub fn format_listing_text(categories: &[CategoryListing]) -> String {
    if categories.is_empty() {
        return "No categories found locally or in the cloud.".to_string();
    }
    let mut out = String::new();
    for category in categories {
        out.push_str(&format!(
            "{} ({})\n",
            format_section_heading(&category.name),
            category.presence.label()
        ));
        if let Some(ref error) = category.error {
            out.push_str(&format!("  {} {}\n", "error:".red(), error));
        }
        if category.projects.is_empty() && category.error.is_none() {
            out.push_str("  (no projects)\n");
        }
        for project in &category.projects {
            out.push_str(&format!("  {} ({})\n", project.name, project.presence.label()));
        }
    }
    out.trim_end().to_string()
}

pub fn format_listing_json(categories: &[CategoryListing]) -> Result<String, SyncError> {
    to_json(&serde_json::json!({ "categories": categories }))
}
