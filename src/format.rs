//! Format group status, scan reports, and audit results as text.

use crate::types::{ClassifiedEntry, GroupStatus, LinkIssue, LinkIssueKind, ScanReport};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Format group status for one asset kind as a table.
pub fn format_status_text(heading: &str, entries: &[GroupStatus]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading(heading)));
    if entries.is_empty() {
        out.push_str("No groups found.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Group", "Active", "Total", "Enabled"]);
    for row in entries {
        table.add_row(vec![
            row.name.clone(),
            row.active.to_string(),
            row.total.to_string(),
            if row.enabled { "yes" } else { "no" }.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    let enabled_count = entries.iter().filter(|e| e.enabled).count();
    out.push_str(&format!(
        "Total: {} groups, {} enabled.\n",
        entries.len(),
        enabled_count
    ));
    out
}

/// Format a reconciler scan report as text.
pub fn format_scan_text(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Unorganized assets")));
    if report.strays.is_empty() {
        out.push_str("Nothing to organize.\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Kind", "Identity", "Type"]);
        for stray in &report.strays {
            table.add_row(vec![
                stray.kind.to_string(),
                stray.identity.clone(),
                if stray.is_dir { "directory" } else { "file" }.to_string(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }
    out.push_str(&format!(
        "\nCommand groups: {}\nSkill groups: {}\n",
        join_or_none(&report.command_groups),
        join_or_none(&report.skill_groups),
    ));
    out
}

/// Format audit issues as text.
pub fn format_audit_text(issues: &[LinkIssue]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Link audit")));
    if issues.is_empty() {
        out.push_str("All links are healthy.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Kind", "Identity", "Issue", "Target"]);
    for issue in issues {
        let label = match issue.issue {
            LinkIssueKind::Broken => "broken",
            LinkIssueKind::Foreign => "foreign",
        };
        table.add_row(vec![
            issue.kind.to_string(),
            issue.identity.clone(),
            label.to_string(),
            issue.target.clone(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Format import classification results as text.
pub fn format_classify_text(entries: &[ClassifiedEntry]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Classification")));
    if entries.is_empty() {
        out.push_str("No entries found.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Identity", "Class"]);
    for entry in entries {
        table.add_row(vec![
            entry.identity.clone(),
            format!("{:?}", entry.class).to_lowercase(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}
