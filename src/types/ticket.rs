use chrono::NaiveDate;
use serde::Serialize;

pub const UNASSIGNED: &str = "Unassigned";
pub const NO_SPRINT: &str = "No Sprint";

/// One issue, normalized from a raw search record.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee: String,
    pub created: String,
    pub updated: String,
    pub issue_type: String,
    pub priority: String,
    pub sprint: String,
}

/// Tickets gathered for one daily report, plus the window they were queried with.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReportBatch {
    pub new_tickets: Vec<TicketSummary>,
    pub transitioned_tickets: Vec<TicketSummary>,
    pub yesterday: NaiveDate,
    pub today: NaiveDate,
}

impl ReportBatch {
    pub fn window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let yesterday = today.pred_opt().unwrap_or(today);
        (yesterday, today)
    }
}
