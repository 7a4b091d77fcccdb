use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::types::{BugSnapshot, MetricPoint};

/// Global output format setting
static OUTPUT_JSON: AtomicBool = AtomicBool::new(false);

pub fn set_json_output(json: bool) {
    OUTPUT_JSON.store(json, Ordering::Relaxed);
}

pub fn is_json_output() -> bool {
    OUTPUT_JSON.load(Ordering::Relaxed)
}

/// Print a table or JSON depending on output mode
pub fn print_table<T, R, F>(items: &[T], to_row: F)
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if is_json_output() {
        println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{table}");
    }
}

/// Print a single item or JSON depending on output mode
pub fn print_item<T: Serialize>(item: &T, display: impl FnOnce(&T)) {
    if is_json_output() {
        println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
    } else {
        display(item);
    }
}

/// Print a message, wrapped in an object in JSON mode
pub fn print_message(message: &str) {
    if is_json_output() {
        println!("{}", serde_json::json!({ "message": message }));
    } else {
        println!("{message}");
    }
}

#[derive(Tabled)]
pub struct MetricRow {
    #[tabled(rename = "Month")]
    pub month: String,
    #[tabled(rename = "From")]
    pub start: String,
    #[tabled(rename = "To")]
    pub end: String,
    #[tabled(rename = "Created")]
    pub created: String,
    #[tabled(rename = "Fixed")]
    pub fixed: String,
}

impl From<&MetricPoint> for MetricRow {
    fn from(point: &MetricPoint) -> Self {
        Self {
            month: point.month.clone(),
            start: point.window.start.to_string(),
            end: point.window.end.to_string(),
            created: count_colored(point.created, false),
            fixed: count_colored(point.fixed, true),
        }
    }
}

pub fn print_metrics(points: &[MetricPoint]) {
    print_table(points, |point| MetricRow::from(point));
}

pub fn print_snapshot(snapshot: &BugSnapshot) {
    print_item(snapshot, |s| {
        println!("{}", "Month to date".bold());
        println!("  Total known bugs: {}", count_colored(s.total, false));
        println!("  New this month:   {}", count_colored(s.created_this_month, false));
        println!("  Fixed this month: {}", count_colored(s.fixed_this_month, true));
    });
}

/// Color a count: fixes in green, anything else yellow, zero dimmed.
pub fn count_colored(count: u64, fixed: bool) -> String {
    let text = count.to_string();
    if count == 0 {
        text.bright_black().to_string()
    } else if fixed {
        text.green().to_string()
    } else {
        text.yellow().to_string()
    }
}

#[derive(Serialize)]
pub struct NextRun {
    pub pipeline: &'static str,
    pub at: String,
}

#[derive(Tabled)]
pub struct NextRunRow {
    #[tabled(rename = "Pipeline")]
    pub pipeline: String,
    #[tabled(rename = "Next run")]
    pub at: String,
}

pub fn print_next_runs(runs: &[NextRun]) {
    print_table(runs, |run| NextRunRow {
        pipeline: run.pipeline.to_string(),
        at: run.at.cyan().to_string(),
    });
}
