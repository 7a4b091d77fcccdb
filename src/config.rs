use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::{DigestError, Result};
use crate::types::BotIdentity;

const DEFAULT_SPRINT_FIELD: &str = "customfield_10020";
const DEFAULT_CHART_SERVICE: &str = "https://quickchart.io";
const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Settings assembled once at startup and handed to every component.
///
/// Values come from an optional TOML file, then environment variables
/// (after `.env` is loaded), with the environment taking precedence.
#[derive(Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub jira: JiraSettings,
    pub mattermost: MattermostSettings,
    pub chart: ChartSettings,
    pub schedule: ScheduleSettings,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct JiraSettings {
    pub base_url: Option<String>,
    pub browse_url: Option<String>,
    pub token: Option<String>,
    pub project_key: Option<String>,
    pub sprint_field: Option<String>,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct MattermostSettings {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub channel: Option<String>,
    pub identity: BotIdentity,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub service_url: Option<String>,
}

#[derive(Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct ScheduleSettings {
    pub timezone: Option<String>,
    pub daily: DailySettings,
    pub monthly: MonthlySettings,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DailySettings {
    pub hour: u32,
    pub minute: u32,
    pub weekdays: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MonthlySettings {
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl Default for DailySettings {
    fn default() -> Self {
        Self {
            hour: 16,
            minute: 50,
            weekdays: ["mon", "tue", "wed", "thu", "fri"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

impl Default for MonthlySettings {
    fn default() -> Self {
        Self {
            day: 1,
            hour: 10,
            minute: 0,
        }
    }
}

impl Config {
    /// Load `.env`, the config file (explicit path or the default location) and
    /// the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        // Best-effort; a missing .env is normal in production
        let _ = dotenvy::dotenv();

        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "jira-digest")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(DigestError::NoConfigDir)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| DigestError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| DigestError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Overlay environment values. Blank values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        overlay(&mut self.jira.base_url, get("JIRA_URI"));
        overlay(&mut self.jira.browse_url, get("JIRA_SERVICE_DOMAIN"));
        overlay(&mut self.jira.token, get("JIRA_TOKEN"));
        overlay(&mut self.jira.project_key, get("JIRA_PROJECT_KEY"));
        overlay(&mut self.jira.sprint_field, get("JIRA_SPRINT_FIELD"));
        overlay(&mut self.mattermost.base_url, get("MATTERMOST_URL"));
        overlay(&mut self.mattermost.token, get("MATTERMOST_TOKEN"));
        overlay(&mut self.mattermost.channel, get("CHANNEL"));
        overlay(&mut self.chart.service_url, get("QUICKCHART_URL"));
        overlay(&mut self.schedule.timezone, get("DIGEST_TIMEZONE"));
    }

    pub fn timezone_name(&self) -> &str {
        self.schedule.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
    }
}

fn overlay(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn required<'a>(value: &'a Option<String>, setting: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .map(|v| v.trim_end_matches('/'))
        .filter(|v| !v.is_empty())
        .ok_or(DigestError::missing(setting))
}

impl JiraSettings {
    pub fn base_url(&self) -> Result<&str> {
        required(&self.base_url, "JIRA_URI")
    }

    pub fn token(&self) -> Result<&str> {
        required(&self.token, "JIRA_TOKEN")
    }

    pub fn project_key(&self) -> Result<&str> {
        required(&self.project_key, "JIRA_PROJECT_KEY")
    }

    /// Root used for ticket links, falling back to the API root.
    pub fn browse_url(&self) -> Result<&str> {
        match required(&self.browse_url, "JIRA_SERVICE_DOMAIN") {
            Ok(url) => Ok(url),
            Err(_) => self.base_url(),
        }
    }

    pub fn sprint_field(&self) -> &str {
        self.sprint_field.as_deref().unwrap_or(DEFAULT_SPRINT_FIELD)
    }
}

impl MattermostSettings {
    pub fn base_url(&self) -> Result<&str> {
        required(&self.base_url, "MATTERMOST_URL")
    }

    pub fn token(&self) -> Result<&str> {
        required(&self.token, "MATTERMOST_TOKEN")
    }

    pub fn channel(&self) -> Result<&str> {
        required(&self.channel, "CHANNEL")
    }
}

impl ChartSettings {
    pub fn service_url(&self) -> &str {
        self.service_url
            .as_deref()
            .map(|v| v.trim_end_matches('/'))
            .unwrap_or(DEFAULT_CHART_SERVICE)
    }
}
