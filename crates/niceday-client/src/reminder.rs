//! Request bodies for `usertrackers/reminder`.

use crate::model::Tracker;
use crate::rrule::RecurrenceRule;
use serde::{Deserialize, Serialize};

/// Window around a scheduled moment, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderMargin {
    pub before: u32,
    pub after: u32,
}

impl Default for ReminderMargin {
    fn default() -> Self {
        Self {
            before: 0,
            after: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringExpression {
    pub margin: ReminderMargin,
    pub reminder_enabled: bool,
    pub reminder_margin: Vec<ReminderMargin>,
    pub rrule: String,
}

/// A reminder schedule for one tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSchedule {
    /// Shown in the niceday app.
    pub title: String,
    /// Tracker name, e.g. `tracker_smoking`.
    pub schedule_type: String,
    pub recurring_expression: RecurringExpression,
}

impl RecurringSchedule {
    pub fn new(
        tracker: Tracker,
        title: impl Into<String>,
        rule: &RecurrenceRule,
        margin: ReminderMargin,
    ) -> Self {
        Self {
            title: title.into(),
            schedule_type: tracker.name().to_string(),
            recurring_expression: RecurringExpression {
                margin,
                reminder_enabled: true,
                reminder_margin: vec![margin],
                rrule: rule.to_string(),
            },
        }
    }
}

/// Body of `POST usertrackers/reminder`.
///
/// niceday-api expects `userId` as a string here, unlike the other endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub user_id: String,
    pub recurring_schedule: RecurringSchedule,
}
