//! Calendar triggers for the daemon. The pipelines themselves know nothing
//! about timing; this module decides when to call their entry points.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use tracing::{error, info};

use crate::config::ScheduleSettings;
use crate::error::{DigestError, Result};
use crate::pipeline::Digest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRule {
    pub hour: u32,
    pub minute: u32,
    pub weekdays: Vec<Weekday>,
}

/// Fires on `day` of every month, or the month's last day when shorter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRule {
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub timezone: Tz,
    pub daily: DailyRule,
    pub monthly: MonthlyRule,
}

impl Schedule {
    pub fn from_settings(settings: &ScheduleSettings, timezone: Tz) -> Result<Self> {
        let daily = &settings.daily;
        let monthly = &settings.monthly;
        check_time(daily.hour, daily.minute)?;
        check_time(monthly.hour, monthly.minute)?;

        if !(1..=31).contains(&monthly.day) {
            return Err(DigestError::InvalidSchedule(format!(
                "monthly day {} is not between 1 and 31",
                monthly.day
            )));
        }

        let weekdays = daily
            .weekdays
            .iter()
            .map(|d| {
                d.parse::<Weekday>()
                    .map_err(|_| DigestError::InvalidSchedule(format!("unknown weekday `{d}`")))
            })
            .collect::<Result<Vec<_>>>()?;

        if weekdays.is_empty() {
            return Err(DigestError::InvalidSchedule(
                "daily schedule has no weekdays".to_string(),
            ));
        }

        Ok(Self {
            timezone,
            daily: DailyRule {
                hour: daily.hour,
                minute: daily.minute,
                weekdays,
            },
            monthly: MonthlyRule {
                day: monthly.day,
                hour: monthly.hour,
                minute: monthly.minute,
            },
        })
    }

    /// First daily fire time strictly after `after`.
    pub fn next_daily(&self, after: DateTime<Utc>) -> Result<DateTime<Tz>> {
        let start = after.with_timezone(&self.timezone).date_naive();

        for offset in 0..=7 {
            let Some(date) = start.checked_add_days(chrono::Days::new(offset)) else {
                break;
            };
            if !self.daily.weekdays.contains(&date.weekday()) {
                continue;
            }
            if let Some(at) = self.at(date, self.daily.hour, self.daily.minute) {
                if at > after {
                    return Ok(at);
                }
            }
        }

        Err(DigestError::InvalidSchedule(format!(
            "no daily fire time after {after}"
        )))
    }

    /// First monthly fire time strictly after `after`.
    pub fn next_monthly(&self, after: DateTime<Utc>) -> Result<DateTime<Tz>> {
        let local = after.with_timezone(&self.timezone).date_naive();
        let first = local
            .with_day(1)
            .ok_or_else(|| DigestError::DateOutOfRange(local.to_string()))?;

        for offset in 0..=12 {
            let Some(month) = first.checked_add_months(Months::new(offset)) else {
                break;
            };
            let Some(date) = clamp_day(month, self.monthly.day) else {
                continue;
            };
            if let Some(at) = self.at(date, self.monthly.hour, self.monthly.minute) {
                if at > after {
                    return Ok(at);
                }
            }
        }

        Err(DigestError::InvalidSchedule(format!(
            "no monthly fire time after {after}"
        )))
    }

    /// Local wall-clock time; `None` inside a DST gap.
    fn at(&self, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
        let naive = date.and_hms_opt(hour, minute, 0)?;
        self.timezone.from_local_datetime(&naive).earliest()
    }
}

fn check_time(hour: u32, minute: u32) -> Result<()> {
    if hour > 23 || minute > 59 {
        return Err(DigestError::InvalidSchedule(format!(
            "{hour:02}:{minute:02} is not a valid time of day"
        )));
    }
    Ok(())
}

/// `day` within the month starting at `first`, clamped to its last day.
fn clamp_day(first: NaiveDate, day: u32) -> Option<NaiveDate> {
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    first.with_day(day.min(last.day()))
}

fn until(at: DateTime<Tz>) -> Duration {
    (at.with_timezone(&Utc) - Utc::now())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Run both pipelines on their schedules until Ctrl-C. A failed run is
/// logged by the pipeline and the loop waits for the next fire time.
pub async fn serve(digest: Arc<Digest>, schedule: Arc<Schedule>) -> Result<()> {
    let daily = {
        let (digest, schedule) = (digest.clone(), schedule.clone());
        tokio::spawn(async move {
            loop {
                let next = match schedule.next_daily(Utc::now()) {
                    Ok(next) => next,
                    Err(e) => {
                        error!(error = %e, "daily schedule stopped");
                        return;
                    }
                };
                info!(next = %next, "daily report scheduled");
                tokio::time::sleep(until(next)).await;
                digest.trigger_daily().await;
            }
        })
    };

    let monthly = tokio::spawn(async move {
        loop {
            let next = match schedule.next_monthly(Utc::now()) {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "monthly schedule stopped");
                    return;
                }
            };
            info!(next = %next, "monthly analytics scheduled");
            tokio::time::sleep(until(next)).await;
            digest.trigger_monthly().await;
        }
    });

    info!("scheduler running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    daily.abort();
    monthly.abort();
    info!("scheduler stopped");
    Ok(())
}
