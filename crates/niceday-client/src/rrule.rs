//! # Recurrence Rules
//!
//! iCalendar (RFC 5545) recurrence rules for tracker reminders.
//!
//! niceday-api forwards the rule text to the niceday app unchanged, so the
//! rendering follows the form the app already receives:
//!
//! ```text
//! DTSTART:20220512T000000
//! RRULE:FREQ=DAILY;INTERVAL=2;COUNT=5;BYDAY=MO,WE
//! ```
//!
//! `INTERVAL` is left out when it is 1, and absent parts are left out.

use crate::Error;
use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ICAL_DATETIME: &str = "%Y%m%dT%H%M%S";

/// How often a rule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutely,
    Secondly,
}

impl Frequency {
    /// RFC 5545 name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yearly => "YEARLY",
            Self::Monthly => "MONTHLY",
            Self::Weekly => "WEEKLY",
            Self::Daily => "DAILY",
            Self::Hourly => "HOURLY",
            Self::Minutely => "MINUTELY",
            Self::Secondly => "SECONDLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yearly" => Ok(Self::Yearly),
            "monthly" => Ok(Self::Monthly),
            "weekly" => Ok(Self::Weekly),
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            "minutely" => Ok(Self::Minutely),
            "secondly" => Ok(Self::Secondly),
            _ => Err(Error::InvalidArgument(format!("unknown frequency '{}'", s))),
        }
    }
}

/// A recurrence rule anchored at a start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    frequency: Frequency,
    dtstart: NaiveDateTime,
    interval: u32,
    count: Option<u32>,
    until: Option<NaiveDateTime>,
    by_weekday: Vec<Weekday>,
}

impl RecurrenceRule {
    /// Rule repeating every `frequency` from `dtstart` on.
    pub fn new(frequency: Frequency, dtstart: NaiveDateTime) -> Self {
        Self {
            frequency,
            dtstart,
            interval: 1,
            count: None,
            until: None,
            by_weekday: Vec::new(),
        }
    }

    /// Repeat every `interval` periods.
    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Stop after `count` occurrences.
    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Stop at `until` (inclusive).
    pub fn until(mut self, until: NaiveDateTime) -> Self {
        self.until = Some(until);
        self
    }

    /// Restrict occurrences to the given weekdays, kept Monday first.
    pub fn by_weekday(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        for day in days {
            if !self.by_weekday.contains(&day) {
                self.by_weekday.push(day);
            }
        }
        self.by_weekday.sort_by_key(|d| d.num_days_from_monday());
        self
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn dtstart(&self) -> NaiveDateTime {
        self.dtstart
    }

    /// Reject rules the niceday app cannot schedule.
    pub fn validate(&self) -> Result<(), Error> {
        if self.interval == 0 {
            return Err(Error::InvalidArgument(
                "recurrence interval must be at least 1".to_string(),
            ));
        }
        if self.count == Some(0) {
            return Err(Error::InvalidArgument(
                "recurrence count must be at least 1".to_string(),
            ));
        }
        if self.count.is_some() && self.until.is_some() {
            return Err(Error::InvalidArgument(
                "recurrence rule cannot have both COUNT and UNTIL".to_string(),
            ));
        }
        if let Some(until) = self.until {
            if until < self.dtstart {
                return Err(Error::InvalidArgument(format!(
                    "recurrence UNTIL {} is before DTSTART {}",
                    until, self.dtstart
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DTSTART:{}", self.dtstart.format(ICAL_DATETIME))?;
        write!(f, "RRULE:FREQ={}", self.frequency)?;
        if self.interval != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        if let Some(count) = self.count {
            write!(f, ";COUNT={}", count)?;
        }
        if let Some(until) = self.until {
            write!(f, ";UNTIL={}", until.format(ICAL_DATETIME))?;
        }
        if !self.by_weekday.is_empty() {
            let days: Vec<&str> = self.by_weekday.iter().map(|d| weekday_code(*d)).collect();
            write!(f, ";BYDAY={}", days.join(","))?;
        }
        Ok(())
    }
}

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}
