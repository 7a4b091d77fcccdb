//! The two scheduled pipelines: the daily ticket report and the monthly bug
//! analytics. `run_*` return errors; `trigger_*` are the scheduler entry
//! points and only log them.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, info_span, Instrument};

use crate::analytics::Analytics;
use crate::chart::{self, ChartRenderer};
use crate::client::JiraClient;
use crate::config::Config;
use crate::error::{DigestError, Result};
use crate::jql::Jql;
use crate::mattermost::MattermostClient;
use crate::normalize::normalize_all;
use crate::report;
use crate::types::{BugSnapshot, ChartArtifact, MetricPoint, ReportBatch};

pub const TRAILING_MONTHS: u32 = 5;
pub const SNAPSHOT_CHART_FILE: &str = "bug-analytics-chart.png";
pub const TREND_CHART_FILE: &str = "multi-line-bug-chart.png";

/// Month-to-date snapshot plus the trailing series.
#[derive(Debug, Clone)]
pub struct MonthlyAnalytics {
    pub snapshot: BugSnapshot,
    pub months: Vec<MetricPoint>,
}

pub struct Digest {
    config: Config,
    timezone: Tz,
}

impl Digest {
    pub fn new(config: Config) -> Result<Self> {
        let name = config.timezone_name();
        let timezone: Tz = name
            .parse()
            .map_err(|_| DigestError::InvalidTimezone(name.to_string()))?;
        Ok(Self { config, timezone })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Current date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    fn jira(&self) -> Result<(JiraClient, &str)> {
        let client = JiraClient::from_config(&self.config.jira)?;
        let project = self.config.jira.project_key()?;
        Ok((client, project))
    }

    fn chat(&self) -> Result<(MattermostClient, &str)> {
        let client = MattermostClient::from_config(&self.config.mattermost)?;
        let channel = self.config.mattermost.channel()?;
        Ok((client, channel))
    }

    /// Tickets created, and tickets whose status changed, between yesterday and `today`.
    pub async fn collect_daily(&self, today: NaiveDate) -> Result<ReportBatch> {
        let (client, project) = self.jira()?;
        let (yesterday, today) = ReportBatch::window(today);

        let new_jql = Jql::project(project).between("created", yesterday, today);
        let transitioned_jql = Jql::project(project)
            .status_changed_after(yesterday)
            .status_changed_before(today);

        let (new_records, transitioned_records) =
            tokio::try_join!(client.search(&new_jql), client.search(&transitioned_jql))?;

        let sprint_field = self.config.jira.sprint_field();
        Ok(ReportBatch {
            new_tickets: normalize_all(&new_records, sprint_field)?,
            transitioned_tickets: normalize_all(&transitioned_records, sprint_field)?,
            yesterday,
            today,
        })
    }

    /// Collect and render the daily report without posting it.
    pub async fn daily_report(&self, today: NaiveDate) -> Result<String> {
        let batch = self.collect_daily(today).await?;
        debug!(
            from = %batch.yesterday,
            to = %batch.today,
            new = batch.new_tickets.len(),
            transitioned = batch.transitioned_tickets.len(),
            "daily batch collected"
        );
        let browse_url = self.config.jira.browse_url()?;
        Ok(report::format(&batch, browse_url))
    }

    pub async fn run_daily(&self, today: NaiveDate) -> Result<()> {
        // Resolve both ends before touching the network.
        let (chat, channel) = self.chat()?;
        self.jira()?;

        let text = self.daily_report(today).await?;
        chat.post_text(channel, &text).await?;

        info!(%today, "daily report delivered");
        Ok(())
    }

    /// Snapshot plus `months` trailing months ending with the current one.
    pub async fn collect_monthly(&self, today: NaiveDate, months: u32) -> Result<MonthlyAnalytics> {
        let (client, project) = self.jira()?;
        let analytics = Analytics::new(client, project);

        let (snapshot, months) = tokio::try_join!(
            analytics.monthly_snapshot(today),
            analytics.trailing_months(today, months),
        )?;

        Ok(MonthlyAnalytics { snapshot, months })
    }

    /// Render the snapshot bar chart and the trend line chart.
    pub async fn render_monthly(
        &self,
        data: &MonthlyAnalytics,
        today: NaiveDate,
    ) -> Result<(ChartArtifact, ChartArtifact)> {
        let renderer = ChartRenderer::from_config(&self.config.chart);
        let (labels, created, fixed) = series(&data.months);

        let bar = renderer
            .render_bar(&chart::snapshot_title(today), &data.snapshot)
            .await?;
        let line = renderer.render_line(&labels, &created, &fixed).await?;
        Ok((bar, line))
    }

    /// Share links for both charts, without rendering them.
    pub fn chart_links(&self, data: &MonthlyAnalytics, today: NaiveDate) -> Result<[String; 2]> {
        let renderer = ChartRenderer::from_config(&self.config.chart);
        let (labels, created, fixed) = series(&data.months);

        Ok([
            renderer.share_url(&chart::bar_description(
                &chart::snapshot_title(today),
                &data.snapshot.as_series(),
            ))?,
            renderer.share_url(&chart::line_description(&labels, &created, &fixed))?,
        ])
    }

    pub async fn run_monthly(&self, today: NaiveDate) -> Result<()> {
        let (chat, channel) = self.chat()?;
        self.jira()?;

        let data = self.collect_monthly(today, TRAILING_MONTHS).await?;
        let (bar, line) = self.render_monthly(&data, today).await?;

        // Per-run directory, so concurrent runs never share files.
        let workdir = tempfile::Builder::new().prefix("jira-digest-").tempdir()?;
        let paths = [
            bar.write_to(workdir.path(), SNAPSHOT_CHART_FILE)?,
            line.write_to(workdir.path(), TREND_CHART_FILE)?,
        ];

        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            files.push(chat.upload_file(channel, path).await?);
        }

        let text = report::monthly_summary(&data.snapshot, &data.months, today);
        chat.post_with_files(channel, &text, &files).await?;

        info!(%today, charts = files.len(), "monthly analytics delivered");
        Ok(())
    }

    /// Scheduler entry point: errors are logged, never propagated.
    pub async fn trigger_daily(&self) {
        let today = self.today();
        let span = info_span!("daily_report", %today);
        if let Err(e) = self.run_daily(today).instrument(span).await {
            error!(error = %e, "daily report failed");
        }
    }

    /// Scheduler entry point: errors are logged, never propagated.
    pub async fn trigger_monthly(&self) {
        let today = self.today();
        let span = info_span!("monthly_analytics", %today);
        if let Err(e) = self.run_monthly(today).instrument(span).await {
            error!(error = %e, "monthly analytics failed");
        }
    }
}

/// Month labels with created and fixed counts, oldest first.
pub fn series(points: &[MetricPoint]) -> (Vec<String>, Vec<u64>, Vec<u64>) {
    let labels = points.iter().map(|p| p.month.clone()).collect();
    let created = points.iter().map(|p| p.created).collect();
    let fixed = points.iter().map(|p| p.fixed).collect();
    (labels, created, fixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JiraSettings, MattermostSettings};
    use serde_json::json;
    use wiremock::matchers::{any, body_partial_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config(base: &str) -> Config {
        let mut config = Config {
            jira: JiraSettings {
                base_url: Some(base.to_string()),
                browse_url: Some("https://team.atlassian.net".to_string()),
                token: Some("me:secret".to_string()),
                project_key: Some("PROJ".to_string()),
                sprint_field: None,
            },
            mattermost: MattermostSettings {
                base_url: Some(base.to_string()),
                token: Some("mm-token".to_string()),
                channel: Some("chan-1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        config.chart.service_url = Some(base.to_string());
        config
    }

    fn search_page(issues: serde_json::Value) -> ResponseTemplate {
        let total = issues.as_array().map(|a| a.len()).unwrap_or(0);
        ResponseTemplate::new(200).set_body_json(json!({ "total": total, "issues": issues }))
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut cfg = config(&server.uri());
        cfg.jira.token = None;
        let digest = Digest::new(cfg).unwrap();

        let daily = digest.run_daily(day(2026, 10, 18)).await.unwrap_err();
        let monthly = digest.run_monthly(day(2026, 10, 18)).await.unwrap_err();
        assert!(daily.is_configuration());
        assert!(monthly.is_configuration());
    }

    #[tokio::test]
    async fn missing_channel_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut cfg = config(&server.uri());
        cfg.mattermost.channel = None;
        let err = Digest::new(cfg)
            .unwrap()
            .run_daily(day(2026, 10, 18))
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::Configuration { setting: "CHANNEL" }));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let mut cfg = Config::default();
        cfg.schedule.timezone = Some("Mars/Olympus".to_string());
        assert!(matches!(
            Digest::new(cfg),
            Err(DigestError::InvalidTimezone(_))
        ));
    }

    #[tokio::test]
    async fn daily_report_is_posted() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/search"))
            .and(wiremock::matchers::query_param(
                "jql",
                r#"project = PROJ AND created >= "2026-10-17" AND created <= "2026-10-18""#,
            ))
            .respond_with(search_page(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search"))
            .and(wiremock::matchers::query_param(
                "jql",
                r#"project = PROJ AND status changed AFTER "2026-10-17" AND status changed BEFORE "2026-10-18""#,
            ))
            .respond_with(search_page(json!([{
                "key": "PROJ-1",
                "fields": {
                    "summary": "Crash on load",
                    "status": { "name": "Open" },
                    "assignee": null,
                    "created": "2026-10-10T09:00:00.000+0530",
                    "updated": "2026-10-17T09:00:00.000+0530",
                    "issuetype": { "name": "Bug" },
                    "priority": { "name": "High" }
                }
            }])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v4/posts"))
            .and(body_string_contains("Status Changes (1)"))
            .and(body_string_contains("New Tickets (0)"))
            .and(body_string_contains(
                "[PROJ-1](https://team.atlassian.net/browse/PROJ-1)",
            ))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let digest = Digest::new(config(&server.uri())).unwrap();
        digest.run_daily(day(2026, 10, 18)).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_record_stops_delivery() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/search"))
            .respond_with(search_page(json!([{ "key": "PROJ-9", "fields": {} }])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let digest = Digest::new(config(&server.uri())).unwrap();
        let err = digest.run_daily(day(2026, 10, 18)).await.unwrap_err();
        assert!(matches!(
            err,
            DigestError::MalformedRecord { ref key, .. } if key == "PROJ-9"
        ));
    }

    #[tokio::test]
    async fn monthly_charts_are_uploaded_then_posted() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "total": 3, "issues": [] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chart"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v4/files"))
            .and(body_string_contains(SNAPSHOT_CHART_FILE))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "file_infos": [{ "id": "f-bar" }] })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v4/files"))
            .and(body_string_contains(TREND_CHART_FILE))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "file_infos": [{ "id": "f-line" }] })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v4/posts"))
            .and(body_partial_json(json!({ "file_ids": ["f-bar", "f-line"] })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let digest = Digest::new(config(&server.uri())).unwrap();
        digest.run_monthly(day(2026, 10, 18)).await.unwrap();
    }

    #[tokio::test]
    async fn collected_months_feed_chart_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "total": 2, "issues": [] })),
            )
            .mount(&server)
            .await;

        let digest = Digest::new(config(&server.uri())).unwrap();
        let today = day(2026, 10, 18);
        let data = digest.collect_monthly(today, 3).await.unwrap();

        assert_eq!(data.snapshot.total, 2);
        let labels: Vec<_> = data.months.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(labels, ["August", "September", "October"]);

        let [bar, line] = digest.chart_links(&data, today).unwrap();
        assert!(bar.starts_with(&format!("{}/chart?", server.uri())));
        assert!(line.contains("September"));
    }

    #[tokio::test]
    async fn trigger_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let digest = Digest::new(config(&server.uri())).unwrap();
        digest.trigger_daily().await;
        digest.trigger_monthly().await;
    }

    #[test]
    fn series_keeps_point_order() {
        let today = day(2026, 10, 18);
        let points: Vec<MetricPoint> = (0..2u32)
            .rev()
            .map(|offset| {
                let window = crate::types::MonthWindow::back_from(today, offset).unwrap();
                MetricPoint {
                    month: window.label(),
                    window,
                    created: u64::from(offset) + 5,
                    fixed: u64::from(offset),
                }
            })
            .collect();

        let (labels, created, fixed) = series(&points);
        assert_eq!(labels, ["September", "October"]);
        assert_eq!(created, [6, 5]);
        assert_eq!(fixed, [1, 0]);
    }
}
