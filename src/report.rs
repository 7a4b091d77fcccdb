//! Chat message rendering: the daily ticket tables and the monthly summary.

use chrono::NaiveDate;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::types::{BugSnapshot, MetricPoint, ReportBatch, TicketSummary, NO_SPRINT};

const NEW_HEADERS: [&str; 7] = ["ID", "Type", "Priority", "Summary", "Assignee", "Status", "Tag"];
const TRANSITIONED_HEADERS: [&str; 7] = [
    "ID",
    "Type",
    "Priority",
    "Summary",
    "Assignee",
    "Current Status",
    "Tag",
];

/// Glyph for a priority label, case-insensitive.
pub fn priority_glyph(priority: &str) -> &'static str {
    match priority.to_lowercase().as_str() {
        "highest" => "🔴",
        "high" => "🟠",
        "medium" => "🟡",
        "low" => "🟢",
        "lowest" => "⚪",
        _ => "⚫",
    }
}

/// Glyph for an issue type label, case-insensitive.
pub fn issue_type_glyph(issue_type: &str) -> &'static str {
    match issue_type.to_lowercase().as_str() {
        "bug" => "🐛",
        "task" => "📋",
        "story" => "📚",
        "epic" => "🏆",
        "improvement" => "⭐",
        _ => "📌",
    }
}

/// Tag for a sprint label. Substrings are checked in a fixed order and the
/// first hit wins.
pub fn sprint_tag(sprint: &str) -> String {
    if sprint.is_empty() || sprint == NO_SPRINT {
        return format!("📌 {NO_SPRINT}");
    }

    let lower = sprint.to_lowercase();
    if lower.contains("roadmap") {
        "🎯 Roadmap".to_string()
    } else if lower.contains("stability") {
        "🛡️ Stability".to_string()
    } else if lower.contains("backlog") {
        "📋 Backlog".to_string()
    } else if lower.contains("current") {
        "🎯 Current".to_string()
    } else {
        format!("🏃 {sprint}")
    }
}

/// Render the batch as a chat-ready markdown message. Output depends only on
/// the batch and `browse_url`.
pub fn format(batch: &ReportBatch, browse_url: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "# 📊 Daily Jira Update ({})\n\n",
        batch.today.format("%Y-%m-%d")
    ));

    out.push_str(&format!("## 🆕 New Tickets ({})\n", batch.new_tickets.len()));
    out.push_str(&ticket_table(&NEW_HEADERS, &batch.new_tickets, browse_url));
    out.push_str("\n\n");

    out.push_str(&format!(
        "## 🔄 Status Changes ({})\n",
        batch.transitioned_tickets.len()
    ));
    out.push_str(&ticket_table(
        &TRANSITIONED_HEADERS,
        &batch.transitioned_tickets,
        browse_url,
    ));
    out.push_str("\n\n");

    out.push_str("> 🔍 Click on ticket IDs to view details\n");
    out
}

/// Message posted alongside the monthly charts.
pub fn monthly_summary(snapshot: &BugSnapshot, months: &[MetricPoint], today: NaiveDate) -> String {
    let mut out = format!(
        "# 📈 Monthly Bug Analytics ({})\n\n",
        today.format("%B %Y")
    );

    out.push_str(&format!(
        "🐛 Total known bugs: **{}** · 🆕 New this month: **{}** · ✅ Fixed this month: **{}**\n\n",
        snapshot.total, snapshot.created_this_month, snapshot.fixed_this_month
    ));

    let mut builder = Builder::default();
    builder.push_record(["Month", "Bugs Created", "Bugs Fixed"]);
    for point in months {
        builder.push_record([
            point.month.clone(),
            point.created.to_string(),
            point.fixed.to_string(),
        ]);
    }
    out.push_str(&builder.build().with(Style::markdown()).to_string());
    out.push('\n');
    out
}

fn ticket_table(headers: &[&str], tickets: &[TicketSummary], browse_url: &str) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));

    for ticket in tickets {
        builder.push_record(ticket_row(ticket, browse_url));
    }

    builder.build().with(Style::markdown()).to_string()
}

fn ticket_row(ticket: &TicketSummary, browse_url: &str) -> Vec<String> {
    vec![
        format!("[{key}]({browse_url}/browse/{key})", key = ticket.key),
        format!(
            "{} {}",
            issue_type_glyph(&ticket.issue_type),
            cell(&ticket.issue_type)
        ),
        format!(
            "{} {}",
            priority_glyph(&ticket.priority),
            cell(&ticket.priority)
        ),
        cell(&ticket.summary),
        format!("👤 {}", cell(&ticket.assignee)),
        format!("🏷️ {}", cell(&ticket.status)),
        cell(&sprint_tag(&ticket.sprint)),
    ]
}

/// Keep free text from breaking the table: one line, no bare pipes.
fn cell(text: &str) -> String {
    text.replace(['\r', '\n'], " ").replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROWSE: &str = "https://team.atlassian.net";

    fn ticket(key: &str, issue_type: &str, priority: &str, sprint: &str) -> TicketSummary {
        TicketSummary {
            key: key.to_string(),
            summary: "Crash on load".to_string(),
            status: "Open".to_string(),
            assignee: "Unassigned".to_string(),
            created: "2026-10-17T09:00:00.000+0530".to_string(),
            updated: "2026-10-17T09:00:00.000+0530".to_string(),
            issue_type: issue_type.to_string(),
            priority: priority.to_string(),
            sprint: sprint.to_string(),
        }
    }

    fn batch(new: Vec<TicketSummary>, transitioned: Vec<TicketSummary>) -> ReportBatch {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let (yesterday, today) = ReportBatch::window(today);
        ReportBatch {
            new_tickets: new,
            transitioned_tickets: transitioned,
            yesterday,
            today,
        }
    }

    #[test]
    fn priority_glyphs_are_case_insensitive() {
        let cases = [
            ("Highest", "🔴"),
            ("HIGH", "🟠"),
            ("medium", "🟡"),
            ("Low", "🟢"),
            ("lowest", "⚪"),
            ("Blocker", "⚫"),
            ("", "⚫"),
        ];
        for (label, glyph) in cases {
            assert_eq!(priority_glyph(label), glyph, "priority {label}");
        }
    }

    #[test]
    fn issue_type_glyphs() {
        let cases = [
            ("Bug", "🐛"),
            ("task", "📋"),
            ("Story", "📚"),
            ("EPIC", "🏆"),
            ("Improvement", "⭐"),
            ("Sub-task", "📌"),
        ];
        for (label, glyph) in cases {
            assert_eq!(issue_type_glyph(label), glyph, "type {label}");
        }
    }

    #[test]
    fn sprint_tags_follow_check_order() {
        assert_eq!(sprint_tag(""), "📌 No Sprint");
        assert_eq!(sprint_tag("No Sprint"), "📌 No Sprint");
        assert_eq!(sprint_tag("Q4 ROADMAP"), "🎯 Roadmap");
        assert_eq!(sprint_tag("Stability week"), "🛡️ Stability");
        assert_eq!(sprint_tag("backlog grooming"), "📋 Backlog");
        assert_eq!(sprint_tag("Current sprint"), "🎯 Current");
        // roadmap is checked before stability and backlog
        assert_eq!(sprint_tag("Stability Roadmap Backlog"), "🎯 Roadmap");
        assert_eq!(sprint_tag("Current backlog"), "📋 Backlog");
        assert_eq!(sprint_tag("Sprint 42"), "🏃 Sprint 42");
    }

    #[test]
    fn empty_batch_renders_zero_counts() {
        let text = format(&batch(vec![], vec![]), BROWSE);

        assert!(text.starts_with("# 📊 Daily Jira Update (2026-10-18)\n"));
        assert!(text.contains("## 🆕 New Tickets (0)"));
        assert!(text.contains("## 🔄 Status Changes (0)"));
        assert!(!text.contains("/browse/"));
        assert!(text.trim_end().ends_with("> 🔍 Click on ticket IDs to view details"));
    }

    #[test]
    fn status_change_row() {
        let text = format(
            &batch(vec![], vec![ticket("PROJ-1", "Bug", "High", "No Sprint")]),
            BROWSE,
        );

        assert!(text.contains("## 🆕 New Tickets (0)"));
        assert!(text.contains("## 🔄 Status Changes (1)"));
        assert!(text.contains("Current Status"));

        let row = text
            .lines()
            .find(|line| line.contains("PROJ-1"))
            .expect("ticket row present");
        assert!(row.contains("[PROJ-1](https://team.atlassian.net/browse/PROJ-1)"));
        assert!(row.contains("🐛 Bug"));
        assert!(row.contains("🟠 High"));
        assert!(row.contains("📌 No Sprint"));
        assert!(row.contains("👤 Unassigned"));
        assert!(row.contains("🏷️ Open"));
        assert!(row.contains("Crash on load"));
    }

    #[test]
    fn format_is_deterministic() {
        let b = batch(
            vec![ticket("PROJ-2", "Story", "Low", "Sprint 9")],
            vec![ticket("PROJ-1", "Bug", "High", "No Sprint")],
        );
        assert_eq!(format(&b, BROWSE), format(&b, BROWSE));
    }

    #[test]
    fn monthly_summary_lists_counts_and_months() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let snapshot = BugSnapshot {
            total: 57,
            created_this_month: 9,
            fixed_this_month: 4,
        };
        let window = crate::types::MonthWindow::back_from(today, 0).unwrap();
        let months = vec![MetricPoint {
            month: window.label(),
            window,
            created: 12,
            fixed: 7,
        }];

        let text = monthly_summary(&snapshot, &months, today);
        assert!(text.starts_with("# 📈 Monthly Bug Analytics (October 2026)"));
        assert!(text.contains("Total known bugs: **57**"));
        assert!(text.contains("Fixed this month: **4**"));
        let row = text.lines().find(|l| l.starts_with("| October")).unwrap();
        assert!(row.contains("12"));
        assert!(row.contains("7"));
    }

    #[test]
    fn pipes_and_newlines_in_summary_are_neutralized() {
        let mut t = ticket("PROJ-3", "Task", "Medium", "No Sprint");
        t.summary = "a | b\nc".to_string();
        let text = format(&batch(vec![t], vec![]), BROWSE);
        let row = text.lines().find(|l| l.contains("PROJ-3")).unwrap();
        assert!(row.contains("a \\| b c"));
    }
}
