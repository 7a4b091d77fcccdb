//! Chart descriptions and rendering through a QuickChart-compatible service.

use chrono::{Datelike, NaiveDate};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::client::remote_error;
use crate::config::ChartSettings;
use crate::error::{DigestError, Result};
use crate::types::{BugSnapshot, ChartArtifact, ChartDescription, ChartKind, ColorSpec, Dataset};

pub const WIDTH: u32 = 1000;
pub const HEIGHT: u32 = 600;
pub const DEVICE_PIXEL_RATIO: u32 = 2;

pub const BAR_LABELS: [&str; 3] = ["Total Known Bugs", "New Bugs", "Bugs Fixed"];
const BAR_FILL: [&str; 3] = [
    "rgba(255, 99, 132, 0.2)",
    "rgba(54, 162, 235, 0.2)",
    "rgba(75, 192, 192, 0.2)",
];
const BAR_BORDER: [&str; 3] = [
    "rgba(255, 99, 132, 1)",
    "rgba(54, 162, 235, 1)",
    "rgba(75, 192, 192, 1)",
];

const CREATED_SERIES: &str = "Bugs Created";
const FIXED_SERIES: &str = "Bugs Fixed";
const CREATED_COLOR: &str = "rgba(54, 162, 235, 1)";
const FIXED_COLOR: &str = "rgba(75, 192, 192, 1)";

/// Dataset title for the month-to-date bar chart, e.g. `Bugs Count (October 1 - 18)`.
pub fn snapshot_title(today: NaiveDate) -> String {
    format!("Bugs Count ({} 1 - {})", today.format("%B"), today.day())
}

/// Single-dataset bar chart over the fixed snapshot categories.
pub fn bar_description(title: &str, series: &[u64]) -> ChartDescription {
    ChartDescription {
        kind: ChartKind::Bar,
        labels: BAR_LABELS.iter().map(|l| l.to_string()).collect(),
        datasets: vec![Dataset {
            label: title.to_string(),
            data: series.to_vec(),
            background_color: Some(ColorSpec::PerPoint(owned(&BAR_FILL))),
            border_color: ColorSpec::PerPoint(owned(&BAR_BORDER)),
            border_width: Some(1),
            fill: None,
        }],
    }
}

/// Two unfilled lines, created and fixed, over shared month labels.
pub fn line_description(labels: &[String], created: &[u64], fixed: &[u64]) -> ChartDescription {
    let line = |label: &str, data: &[u64], color: &str| Dataset {
        label: label.to_string(),
        data: data.to_vec(),
        background_color: None,
        border_color: ColorSpec::Single(color.to_string()),
        border_width: None,
        fill: Some(false),
    };

    ChartDescription {
        kind: ChartKind::Line,
        labels: labels.to_vec(),
        datasets: vec![
            line(CREATED_SERIES, created, CREATED_COLOR),
            line(FIXED_SERIES, fixed, FIXED_COLOR),
        ],
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest {
    chart: Value,
    width: u32,
    height: u32,
    device_pixel_ratio: u32,
    format: &'static str,
}

pub struct ChartRenderer {
    http: Client,
    service_url: String,
}

impl ChartRenderer {
    pub fn from_config(settings: &ChartSettings) -> Self {
        Self {
            http: Client::new(),
            service_url: settings.service_url().to_string(),
        }
    }

    pub async fn render_bar(&self, title: &str, snapshot: &BugSnapshot) -> Result<ChartArtifact> {
        self.render(bar_description(title, &snapshot.as_series())).await
    }

    pub async fn render_line(
        &self,
        labels: &[String],
        created: &[u64],
        fixed: &[u64],
    ) -> Result<ChartArtifact> {
        self.render(line_description(labels, created, fixed)).await
    }

    /// GET-style link that re-renders the chart; logged for diagnostics.
    pub fn share_url(&self, description: &ChartDescription) -> Result<String> {
        let config = serde_json::to_string(&description.to_config())?;
        let base = format!("{}/chart", self.service_url);

        let (width, height, ratio) = (
            WIDTH.to_string(),
            HEIGHT.to_string(),
            DEVICE_PIXEL_RATIO.to_string(),
        );

        let url = Url::parse_with_params(
            &base,
            &[
                ("c", config.as_str()),
                ("w", width.as_str()),
                ("h", height.as_str()),
                ("devicePixelRatio", ratio.as_str()),
                ("f", "png"),
            ],
        )
        .map_err(|_| DigestError::InvalidUrl(base.clone()))?;

        Ok(url.to_string())
    }

    /// Render to PNG bytes.
    pub async fn render(&self, description: ChartDescription) -> Result<ChartArtifact> {
        let url = self.share_url(&description)?;
        let request = RenderRequest {
            chart: description.to_config(),
            width: WIDTH,
            height: HEIGHT,
            device_pixel_ratio: DEVICE_PIXEL_RATIO,
            format: "png",
        };

        debug!(kind = ?description.kind, "rendering chart");
        let response = self
            .http
            .post(format!("{}/chart", self.service_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error("QuickChart", response).await);
        }

        let bytes = response.bytes().await?.to_vec();
        info!(kind = ?description.kind, size = bytes.len(), chart_url = %url, "chart rendered");

        Ok(ChartArtifact {
            description,
            url,
            bytes,
        })
    }
}
