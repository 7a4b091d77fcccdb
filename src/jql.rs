//! Structured builder for tracker query expressions.
//!
//! Callers describe a query as project, type, status set and date bounds;
//! quoting happens here and nowhere else. URL-encoding is left to the client.

use std::fmt;

use chrono::NaiveDate;

/// Statuses that count as closed for open-bug totals.
pub const TERMINAL_STATUSES: [&str; 3] = ["Archived", "Closed", "Done"];

pub const DONE: &str = "Done";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    Project(String),
    IssueType(String),
    StatusIs(String),
    StatusIn(Vec<String>),
    StatusNotIn(Vec<String>),
    OnOrAfter(&'static str, NaiveDate),
    OnOrBefore(&'static str, NaiveDate),
    StatusChangedAfter(NaiveDate),
    StatusChangedBefore(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jql {
    clauses: Vec<Clause>,
    order_by: Option<(&'static str, Direction)>,
}

impl Jql {
    /// Every query is scoped to one project.
    pub fn project(key: &str) -> Self {
        Self {
            clauses: vec![Clause::Project(key.to_string())],
            order_by: None,
        }
    }

    pub fn issue_type(mut self, issue_type: &str) -> Self {
        self.clauses.push(Clause::IssueType(issue_type.to_string()));
        self
    }

    pub fn status_is(mut self, status: &str) -> Self {
        self.clauses.push(Clause::StatusIs(status.to_string()));
        self
    }

    pub fn status_in(mut self, statuses: &[&str]) -> Self {
        self.clauses.push(Clause::StatusIn(owned(statuses)));
        self
    }

    pub fn status_not_in(mut self, statuses: &[&str]) -> Self {
        self.clauses.push(Clause::StatusNotIn(owned(statuses)));
        self
    }

    /// `field >= "date"`
    pub fn on_or_after(mut self, field: &'static str, date: NaiveDate) -> Self {
        self.clauses.push(Clause::OnOrAfter(field, date));
        self
    }

    /// `field <= "date"`
    pub fn on_or_before(mut self, field: &'static str, date: NaiveDate) -> Self {
        self.clauses.push(Clause::OnOrBefore(field, date));
        self
    }

    /// Inclusive date range on `field`.
    pub fn between(self, field: &'static str, start: NaiveDate, end: NaiveDate) -> Self {
        self.on_or_after(field, start).on_or_before(field, end)
    }

    pub fn status_changed_after(mut self, date: NaiveDate) -> Self {
        self.clauses.push(Clause::StatusChangedAfter(date));
        self
    }

    pub fn status_changed_before(mut self, date: NaiveDate) -> Self {
        self.clauses.push(Clause::StatusChangedBefore(date));
        self
    }

    pub fn order_by(mut self, field: &'static str, direction: Direction) -> Self {
        self.order_by = Some((field, direction));
        self
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Bare when the value is a plain word, quoted (with escapes) otherwise.
fn escape_value(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        value.to_string()
    } else {
        quote(value)
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn value_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| escape_value(v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn date(value: NaiveDate) -> String {
    quote(&value.format("%Y-%m-%d").to_string())
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Project(key) => write!(f, "project = {}", escape_value(key)),
            Clause::IssueType(t) => write!(f, "type = {}", escape_value(t)),
            Clause::StatusIs(s) => write!(f, "status = {}", escape_value(s)),
            Clause::StatusIn(s) => write!(f, "status IN ({})", value_list(s)),
            Clause::StatusNotIn(s) => write!(f, "status NOT IN ({})", value_list(s)),
            Clause::OnOrAfter(field, d) => write!(f, "{field} >= {}", date(*d)),
            Clause::OnOrBefore(field, d) => write!(f, "{field} <= {}", date(*d)),
            Clause::StatusChangedAfter(d) => write!(f, "status changed AFTER {}", date(*d)),
            Clause::StatusChangedBefore(d) => write!(f, "status changed BEFORE {}", date(*d)),
        }
    }
}

impl fmt::Display for Jql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", clauses.join(" AND "))?;

        if let Some((field, direction)) = self.order_by {
            let dir = match direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            write!(f, " ORDER BY {field} {dir}")?;
        }
        Ok(())
    }
}
