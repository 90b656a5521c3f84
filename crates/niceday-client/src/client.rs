//! # Client Module
//!
//! HTTP client for niceday-api.

use crate::config::{ClientConfig, DEFAULT_API_URI, DEFAULT_TIMEOUT_SECS};
use crate::model::{
    ApiAck, SmokingTrackerEntry, Tracker, TrackerStatus, UserData, UserProfile,
};
use crate::reminder::{RecurringSchedule, ReminderMargin, ReminderRequest};
use crate::rrule::RecurrenceRule;
use crate::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Error markers niceday-api puts in `message` when the niceday server refused
/// a request.
const SERVER_ERROR_MARKERS: [&str; 2] = [
    "Unauthorized error",
    "The requested resource could not be found",
];

const USER_AGENT: &str = concat!("niceday-client/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    recipient_id: u64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackerStatusesBody<'a> {
    user_id: u64,
    tracker_statuses: &'a [TrackerStatus],
}

// =============================================================================
// CLIENT
// =============================================================================

/// Client for interacting with the niceday-api component of the PerfectFit
/// stack.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct NicedayClient {
    api_uri: String,
    client: reqwest::Client,
}

impl Default for NicedayClient {
    /// Client for niceday-api on `http://localhost:8080/`.
    fn default() -> Self {
        Self::new(DEFAULT_API_URI)
    }
}

impl NicedayClient {
    /// Create a client for the given niceday-api URI with a 30-second timeout.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = NicedayClient::new("http://localhost:8080/");
    /// ```
    pub fn new(api_uri: impl Into<String>) -> Self {
        let api_uri = api_uri.into();
        Self {
            api_uri: format!("{}/", api_uri.trim().trim_end_matches('/')),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a client from a validated [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URI or timeout is invalid, or
    /// [`Error::Http`] if the HTTP client fails to build.
    pub fn with_config(config: &ClientConfig) -> Result<Self, Error> {
        let api_uri = config.normalized_api_uri()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { api_uri, client })
    }

    /// Base URI, always ending in `/`.
    pub fn api_uri(&self) -> &str {
        &self.api_uri
    }

    // -------------------------------------------------------------------------
    // USER DATA
    // -------------------------------------------------------------------------

    /// Raw user data for `user_id`.
    ///
    /// The shape depends on what is stored on the Sense server; see
    /// [`UserData`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotJson`] if niceday-api did not answer with JSON and
    /// [`Error::Server`] if the niceday server refused the request. A JSON
    /// body that is not an object gives [`Error::UnexpectedData`].
    pub async fn user_data(&self, user_id: u64) -> Result<UserData, Error> {
        let response = self
            .call_api::<()>(Method::GET, &format!("userdata/{}", user_id), &[], None)
            .await?;
        let json = extract_json(response).await?;
        if !json.is_object() {
            return Err(Error::UnexpectedData(format!(
                "expected user data to contain the key \"userProfile\", got {}",
                json
            )));
        }
        Ok(serde_json::from_value(json)?)
    }

    /// Profile of `user_id`: first and last name, location, birth date and
    /// gender.
    ///
    /// # Errors
    ///
    /// Same as [`user_data`](Self::user_data), plus
    /// [`Error::UnexpectedData`] if the profile or one of its keys is missing.
    pub async fn get_profile(&self, user_id: u64) -> Result<UserProfile, Error> {
        let data = self.user_data(user_id).await?;
        UserProfile::from_user_data(&data)
    }

    // -------------------------------------------------------------------------
    // MESSAGES
    // -------------------------------------------------------------------------

    /// Send a text message to `recipient_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for blank text.
    pub async fn post_message(&self, recipient_id: u64, text: &str) -> Result<ApiAck, Error> {
        if text.trim().is_empty() {
            return Err(Error::InvalidArgument("message text is empty".to_string()));
        }
        let body = MessageBody { recipient_id, text };
        let response = self
            .call_api(Method::POST, "messages/", &[], Some(&body))
            .await?;
        acknowledge(response).await
    }

    // -------------------------------------------------------------------------
    // TRACKERS
    // -------------------------------------------------------------------------

    /// Enable or disable trackers for `user_id`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// client
    ///     .set_user_tracker_statuses(12345, &[TrackerStatus::for_tracker(Tracker::Smoking, true)])
    ///     .await?;
    /// ```
    pub async fn set_user_tracker_statuses(
        &self,
        user_id: u64,
        tracker_statuses: &[TrackerStatus],
    ) -> Result<ApiAck, Error> {
        let body = TrackerStatusesBody {
            user_id,
            tracker_statuses,
        };
        let response = self
            .call_api(Method::POST, "usertrackers/statuses", &[], Some(&body))
            .await?;
        acknowledge(response).await
    }

    /// Smoking tracker registrations of `user_id` between `start_time` and
    /// `end_time`.
    ///
    /// Each entry carries its start and end time and the number of cigarettes
    /// smoked (`value.quantity`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `start_time` is after `end_time`.
    pub async fn get_smoking_tracker(
        &self,
        user_id: u64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<SmokingTrackerEntry>, Error> {
        if start_time > end_time {
            return Err(Error::InvalidArgument(format!(
                "start time {} is after end time {}",
                api_timestamp(&start_time),
                api_timestamp(&end_time)
            )));
        }
        let query = [
            ("startTime", api_timestamp(&start_time)),
            ("endTime", api_timestamp(&end_time)),
        ];
        let response = self
            .call_api::<()>(
                Method::GET,
                &format!("usertrackers/smoking/{}", user_id),
                &query,
                None,
            )
            .await?;
        let json = extract_json(response).await?;
        Ok(serde_json::from_value(json)?)
    }

    /// Schedule a recurring reminder for `tracker`, using the default margin
    /// of 0 minutes before and 60 minutes after each occurrence.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let rule = RecurrenceRule::new(Frequency::Daily, start).until(end);
    /// client.set_tracker_reminder(12345, Tracker::Smoking, "Log your cigarettes", &rule).await?;
    /// ```
    pub async fn set_tracker_reminder(
        &self,
        user_id: u64,
        tracker: Tracker,
        reminder_title: &str,
        recurrence_rule: &RecurrenceRule,
    ) -> Result<ApiAck, Error> {
        self.set_tracker_reminder_with_margin(
            user_id,
            tracker,
            reminder_title,
            recurrence_rule,
            ReminderMargin::default(),
        )
        .await
    }

    /// [`set_tracker_reminder`](Self::set_tracker_reminder) with an explicit
    /// margin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a blank title or an invalid rule.
    pub async fn set_tracker_reminder_with_margin(
        &self,
        user_id: u64,
        tracker: Tracker,
        reminder_title: &str,
        recurrence_rule: &RecurrenceRule,
        margin: ReminderMargin,
    ) -> Result<ApiAck, Error> {
        if reminder_title.trim().is_empty() {
            return Err(Error::InvalidArgument("reminder title is empty".to_string()));
        }
        recurrence_rule.validate()?;

        let body = ReminderRequest {
            user_id: user_id.to_string(),
            recurring_schedule: RecurringSchedule::new(
                tracker,
                reminder_title,
                recurrence_rule,
                margin,
            ),
        };
        let response = self
            .call_api(Method::POST, "usertrackers/reminder", &[], Some(&body))
            .await?;
        acknowledge(response).await
    }

    // -------------------------------------------------------------------------
    // TRANSPORT
    // -------------------------------------------------------------------------

    /// Send one request to niceday-api.
    ///
    /// Only GET and POST are supported. Non-2xx responses become
    /// [`Error::Status`].
    async fn call_api<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let url = format!("{}{}", self.api_uri, path);
        let mut request = if method == Method::GET {
            self.client.get(&url)
        } else if method == Method::POST {
            self.client.post(&url)
        } else {
            return Err(Error::UnsupportedMethod(method.to_string()));
        };
        request = request.header(ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, %url, "calling niceday-api");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %url, "niceday-api returned an error status");
            return Err(Error::Status {
                status: status.as_u16(),
                url,
                body,
            });
        }
        Ok(response)
    }
}

// =============================================================================
// RESPONSE HANDLING
// =============================================================================

/// Parse a response body as JSON and surface niceday server errors.
async fn extract_json(response: reqwest::Response) -> Result<Value, Error> {
    let bytes = response.bytes().await?;
    let json: Value = serde_json::from_slice(&bytes).map_err(|_| Error::NotJson)?;
    for marker in SERVER_ERROR_MARKERS {
        check_server_error(&json, marker)?;
    }
    Ok(json)
}

/// Fail if `results.message` contains `marker`.
fn check_server_error(results: &Value, marker: &str) -> Result<(), Error> {
    let Some(message) = results.get("message").and_then(Value::as_str) else {
        return Ok(());
    };
    if !message.contains(marker) {
        return Ok(());
    }

    let mut msg = format!("'{}' response from niceday server. ", marker);
    if let Some(details) = results.get("details").and_then(|d| d.get("body")) {
        match details {
            Value::String(s) => msg += &format!("Details provided: {}", s),
            other => msg += &format!("Details provided: {}", other),
        }
    }
    warn!(%marker, "niceday server refused the request");
    Err(Error::Server(msg))
}

async fn acknowledge(response: reqwest::Response) -> Result<ApiAck, Error> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    Ok(ApiAck {
        status,
        body: serde_json::from_slice(&bytes).ok(),
    })
}

/// Timestamp in the form niceday-api expects: ISO 8601, UTC, trailing `Z`.
///
/// Fractions of a second are written as microseconds, and only when present.
pub fn api_timestamp(time: &DateTime<Utc>) -> String {
    let format = if time.timestamp_subsec_nanos() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    time.to_rfc3339_opts(format, true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn new_normalizes_trailing_slash() {
        assert_eq!(NicedayClient::new("http://localhost:8080").api_uri(), "http://localhost:8080/");
        assert_eq!(NicedayClient::new("http://localhost:8080///").api_uri(), "http://localhost:8080/");
        assert_eq!(NicedayClient::default().api_uri(), DEFAULT_API_URI);
    }

    #[test]
    fn with_config_rejects_bad_uri() {
        let result = NicedayClient::with_config(&ClientConfig::new("ftp://niceday"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn timestamps_are_utc_with_z() {
        let t = Utc.with_ymd_and_hms(2021, 10, 1, 1, 1, 1).unwrap();
        assert_eq!(api_timestamp(&t), "2021-10-01T01:01:01Z");
    }

    #[test]
    fn fractional_timestamps_use_microseconds() {
        let t = Utc.with_ymd_and_hms(2021, 10, 1, 1, 1, 1).unwrap() + chrono::Duration::milliseconds(500);
        assert_eq!(api_timestamp(&t), "2021-10-01T01:01:01.500000Z");
        let t = Utc.with_ymd_and_hms(2021, 10, 1, 1, 1, 1).unwrap() + chrono::Duration::microseconds(7);
        assert_eq!(api_timestamp(&t), "2021-10-01T01:01:01.000007Z");
    }

    #[test]
    fn server_error_without_details() {
        let results = json!({"message": "Unauthorized error"});
        let err = check_server_error(&results, "Unauthorized error").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'Unauthorized error' response from niceday server. "
        );
    }

    #[test]
    fn server_error_with_details() {
        let results = json!({
            "message": "Request failed: The requested resource could not be found",
            "details": {"body": "user 1 unknown"}
        });
        let err = check_server_error(&results, "The requested resource could not be found")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "'The requested resource could not be found' response from niceday server. \
             Details provided: user 1 unknown"
        );
    }

    #[test]
    fn unrelated_message_passes() {
        let results = json!({"message": "all good"});
        assert!(check_server_error(&results, "Unauthorized error").is_ok());
        assert!(check_server_error(&json!([1, 2]), "Unauthorized error").is_ok());
    }
}
