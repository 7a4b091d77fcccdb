//! Bug counts over calendar windows, built from tracker `count` queries.

use chrono::{Datelike, NaiveDate};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::client::JiraClient;
use crate::error::{DigestError, Result};
use crate::jql::{Direction, Jql, DONE, TERMINAL_STATUSES};
use crate::types::{BugSnapshot, MetricPoint, MonthWindow};

const BUG: &str = "Bug";

pub struct Analytics {
    client: JiraClient,
    project: String,
}

impl Analytics {
    pub fn new(client: JiraClient, project_key: &str) -> Self {
        Self {
            client,
            project: project_key.to_string(),
        }
    }

    fn bugs(&self) -> Jql {
        Jql::project(&self.project).issue_type(BUG)
    }

    /// Open bugs, bugs created this month and bugs done this month, in that order.
    pub fn snapshot_queries(&self, today: NaiveDate) -> Result<[Jql; 3]> {
        let first_day = today
            .with_day(1)
            .ok_or_else(|| DigestError::DateOutOfRange(today.to_string()))?;

        let total = self
            .bugs()
            .status_not_in(&TERMINAL_STATUSES)
            .order_by("created", Direction::Desc);
        let created = self
            .bugs()
            .status_not_in(&TERMINAL_STATUSES)
            .on_or_after("created", first_day)
            .order_by("created", Direction::Desc);
        let fixed = self
            .bugs()
            .status_in(&[DONE])
            .on_or_after("updated", first_day)
            .order_by("created", Direction::Desc);

        Ok([total, created, fixed])
    }

    /// Created and fixed queries for one month.
    pub fn window_queries(&self, window: &MonthWindow) -> (Jql, Jql) {
        let created = self.bugs().between("created", window.start, window.end);
        let fixed = self
            .bugs()
            .status_is(DONE)
            .between("updated", window.start, window.end);
        (created, fixed)
    }

    pub async fn monthly_snapshot(&self, today: NaiveDate) -> Result<BugSnapshot> {
        let [total, created, fixed] = self.snapshot_queries(today)?;

        let (total, created_this_month, fixed_this_month) = tokio::try_join!(
            self.client.count(&total),
            self.client.count(&created),
            self.client.count(&fixed),
        )?;

        info!(total, created_this_month, fixed_this_month, "bug snapshot fetched");
        Ok(BugSnapshot {
            total,
            created_this_month,
            fixed_this_month,
        })
    }

    /// Counts for the `months` calendar months ending with the current one,
    /// oldest first. Months are fetched concurrently.
    pub async fn trailing_months(&self, today: NaiveDate, months: u32) -> Result<Vec<MetricPoint>> {
        let mut tasks = JoinSet::new();

        for offset in 0..months {
            let window = MonthWindow::back_from(today, offset)
                .ok_or_else(|| DigestError::DateOutOfRange(format!("{today} - {offset} months")))?;
            let (created_jql, fixed_jql) = self.window_queries(&window);
            let client = self.client.clone();

            tasks.spawn(async move {
                let (created, fixed) =
                    tokio::try_join!(client.count(&created_jql), client.count(&fixed_jql))?;
                debug!(month = %window.label(), created, fixed, "month counted");

                Ok::<_, DigestError>((
                    offset,
                    MetricPoint {
                        month: window.label(),
                        window,
                        created,
                        fixed,
                    },
                ))
            });
        }

        let mut points = Vec::with_capacity(months as usize);
        while let Some(joined) = tasks.join_next().await {
            points.push(joined??);
        }

        // Larger offset is further back in time.
        points.sort_by(|a, b| b.0.cmp(&a.0));
        info!(months, "trailing month counts fetched");

        Ok(points.into_iter().map(|(_, point)| point).collect())
    }
}
