//! # Model Module
//!
//! Request and response types for the niceday-api endpoints.
//!
//! Payloads coming from the Sense server are only partly under our control,
//! so response types keep every field they do not name in an `extra` map
//! instead of rejecting them.

use crate::Error;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// TRACKERS
// =============================================================================

/// Trackers known to the niceday app.
///
/// Use these instead of hardcoding tracker ids or names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tracker {
    /// Cigarette counter.
    Smoking,
}

impl Tracker {
    /// All known trackers.
    pub const ALL: [Tracker; 1] = [Tracker::Smoking];

    /// Numeric tracker id used by `usertrackers/statuses`.
    pub fn id(self) -> u32 {
        match self {
            Self::Smoking => 1,
        }
    }

    /// Tracker name used as reminder `schedule_type`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Smoking => "tracker_smoking",
        }
    }

    /// Look a tracker up by its numeric id.
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }
}

impl fmt::Display for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tracker {
    type Err = Error;

    /// Accepts the full name (`tracker_smoking`) or the short form (`smoking`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == wanted || t.name().strip_prefix("tracker_") == Some(wanted.as_str()))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown tracker '{}'", s)))
    }
}

/// Whether a tracker is enabled for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerStatus {
    pub tracker_id: u32,
    pub is_enabled: bool,
}

impl TrackerStatus {
    /// Status for a raw tracker id.
    pub fn new(tracker_id: u32, is_enabled: bool) -> Self {
        Self {
            tracker_id,
            is_enabled,
        }
    }

    /// Status for a known tracker.
    pub fn for_tracker(tracker: Tracker, is_enabled: bool) -> Self {
        Self::new(tracker.id(), is_enabled)
    }
}

// =============================================================================
// USER DATA
// =============================================================================

/// Keys extracted from `userProfile` by
/// [`NicedayClient::get_profile`](crate::NicedayClient::get_profile).
pub const USER_PROFILE_KEYS: [&str; 5] = ["firstName", "lastName", "location", "birthDate", "gender"];

/// Raw user data as stored on the Sense server.
///
/// Holds the user's `networks` (memberId, role, ...), `userProfile` (name,
/// location, bio, birth date, ...) and `user` info (username, email, date
/// joined, ...). The exact shape is decided by the Sense server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The profile fields of a niceday user.
///
/// Every key must be present in the server payload; a `null` value becomes
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
}

impl UserProfile {
    /// Extract the profile from raw user data.
    pub fn from_user_data(data: &UserData) -> Result<Self, Error> {
        let profile = data.user_profile.as_ref().ok_or_else(|| {
            Error::UnexpectedData(
                "expected user data to contain the key \"userProfile\" but this is missing. \
                 Has the data structure stored on the Senseserver changed?"
                    .to_string(),
            )
        })?;

        let field = |key: &str| -> Result<Option<String>, Error> {
            profile.get(key).map(text_value).ok_or_else(|| {
                Error::UnexpectedData(format!(
                    "\"userProfile\" does not contain expected key \"{}\". \
                     Has the data structure stored on the Senseserver changed?",
                    key
                ))
            })
        };

        Ok(Self {
            first_name: field("firstName")?,
            last_name: field("lastName")?,
            location: field("location")?,
            birth_date: field("birthDate")?,
            gender: field("gender")?,
        })
    }

    /// Look a field up by its niceday key.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "firstName" => &self.first_name,
            "lastName" => &self.last_name,
            "location" => &self.location,
            "birthDate" => &self.birth_date,
            "gender" => &self.gender,
            _ => return None,
        };
        value.as_deref()
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// SMOKING TRACKER
// =============================================================================

/// One registration in the smoking tracker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmokingTrackerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub value: TrackerValue,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SmokingTrackerEntry {
    /// Parsed start time, if present and RFC 3339.
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        self.start_time.as_deref().and_then(parse_time)
    }

    /// Parsed end time, if present and RFC 3339.
    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        self.end_time.as_deref().and_then(parse_time)
    }

    /// Cigarettes smoked in this entry.
    ///
    /// Whole-valued floats (`1.0`) and numeric strings count; anything else,
    /// or no quantity at all, counts as 0.
    pub fn quantity(&self) -> i64 {
        match &self.value.quantity {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Value part of a tracker entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackerValue {
    /// Kept as sent; read it through [`SmokingTrackerEntry::quantity`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn parse_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// Total number of cigarettes across entries.
pub fn total_quantity(entries: &[SmokingTrackerEntry]) -> i64 {
    entries.iter().map(SmokingTrackerEntry::quantity).sum()
}

// =============================================================================
// POST ACKNOWLEDGEMENT
// =============================================================================

/// Result of a POST to niceday-api.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiAck {
    /// HTTP status code returned by niceday-api.
    pub status: u16,
    /// Response body, when niceday-api returned JSON.
    pub body: Option<Value>,
}
