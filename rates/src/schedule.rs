//! Daily refresh schedule.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

use crate::error::{RatesError, RatesResult};

/// Fires once a day at a fixed UTC time, midnight by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    /// Fire every day at `hour_utc`:00.
    pub fn at_hour(hour_utc: u32) -> RatesResult<Self> {
        let at = NaiveTime::from_hms_opt(hour_utc, 0, 0).ok_or_else(|| {
            RatesError::Configuration(format!("refresh hour {} out of range", hour_utc))
        })?;
        Ok(Self { at })
    }

    /// Midnight UTC.
    pub fn midnight() -> Self {
        Self {
            at: NaiveTime::default(),
        }
    }

    /// Next firing strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = Utc.from_utc_datetime(&now.date_naive().and_time(self.at));
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Time left until the next firing.
    pub fn until_next(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.next_after(now) - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self::midnight()
    }
}
