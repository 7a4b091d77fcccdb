use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{DigestError, Result};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
}

/// Chart.js accepts a single color or one per data point.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ColorSpec {
    Single(String),
    PerPoint(Vec<String>),
}

/// One series in a chart description.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ColorSpec>,
    pub border_color: ColorSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
}

/// Declarative chart handed to the rendering service.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDescription {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartDescription {
    /// Chart.js configuration; the y axis always starts at zero.
    pub fn to_config(&self) -> Value {
        json!({
            "type": self.kind,
            "data": {
                "labels": self.labels,
                "datasets": self.datasets,
            },
            "options": {
                "scales": {
                    "y": { "beginAtZero": true }
                }
            }
        })
    }
}

/// A rendered chart: its description, the image bytes and a shareable URL.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub description: ChartDescription,
    pub url: String,
    pub bytes: Vec<u8>,
}

impl ChartArtifact {
    /// Write the image into `dir` under `file_name`, returning the full path.
    pub fn write_to(&self, dir: &Path, file_name: &str) -> Result<PathBuf> {
        let path = dir.join(file_name);
        std::fs::write(&path, &self.bytes).map_err(|e| DigestError::FileWrite {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(path)
    }
}
