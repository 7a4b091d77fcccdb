use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

/// A calendar month, first to last day inclusive.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthWindow {
    /// The month `offset` months before the one containing `today`.
    pub fn back_from(today: NaiveDate, offset: u32) -> Option<Self> {
        let first = today.with_day(1)?.checked_sub_months(Months::new(offset))?;
        let end = first.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(Self { start: first, end })
    }

    /// Long month name, e.g. "February".
    pub fn label(&self) -> String {
        self.start.format("%B").to_string()
    }
}

/// Counts for one month of the trailing series.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MetricPoint {
    pub month: String,
    pub window: MonthWindow,
    pub created: u64,
    pub fixed: u64,
}

/// Month-to-date bug counts.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BugSnapshot {
    pub total: u64,
    pub created_this_month: u64,
    pub fixed_this_month: u64,
}

impl BugSnapshot {
    pub fn as_series(&self) -> [u64; 3] {
        [self.total, self.created_this_month, self.fixed_this_month]
    }
}
