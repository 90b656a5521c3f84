//! # CLI Module
//!
//! Command definitions and the functions behind them.
//!
//! Every `cmd_*` function returns the text printed on stdout, so commands can
//! be tested without capturing process output.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use niceday_client::{
    ClientConfig, Error, Frequency, NicedayClient, RecurrenceRule, Tracker, TrackerStatus,
    VERSION, total_quantity,
};
use tracing::info;

// =============================================================================
// ARGUMENTS
// =============================================================================

/// Talk to niceday-api from the command line.
#[derive(Debug, Parser)]
#[command(name = "niceday", version, about)]
pub struct Cli {
    /// niceday-api base URI
    #[arg(long, global = true, env = "NICEDAY_API_URI")]
    pub api_uri: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "NICEDAY_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// Log requests (debug level) unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a user's profile
    Profile { user_id: u64 },

    /// Print all data niceday-api has for a user
    UserData { user_id: u64 },

    /// Send a text message to a user
    Message { recipient_id: u64, text: String },

    /// Enable or disable a tracker for a user
    Trackers {
        user_id: u64,
        #[arg(long, default_value = "smoking", value_parser = parse_tracker)]
        tracker: Tracker,
        /// Disable instead of enable
        #[arg(long)]
        disable: bool,
    },

    /// Print smoking tracker entries in a time range
    Smoking {
        user_id: u64,
        #[arg(long, value_parser = parse_datetime)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_datetime)]
        end: DateTime<Utc>,
    },

    /// Schedule a recurring tracker reminder
    Reminder {
        user_id: u64,
        #[arg(long, default_value = "smoking", value_parser = parse_tracker)]
        tracker: Tracker,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "daily", value_parser = parse_frequency)]
        freq: Frequency,
        #[arg(long, value_parser = parse_datetime)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_datetime, conflicts_with = "count")]
        until: Option<DateTime<Utc>>,
        #[arg(long)]
        count: Option<u32>,
        #[arg(long, default_value_t = 1)]
        interval: u32,
    },

    /// Print the version
    Version,
}

impl Cli {
    /// Client settings: flags and environment over defaults.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(uri) = &self.api_uri {
            config.api_uri = uri.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config
    }
}

fn parse_tracker(raw: &str) -> Result<Tracker, String> {
    raw.parse().map_err(|e: Error| e.to_string())
}

fn parse_frequency(raw: &str) -> Result<Frequency, String> {
    raw.parse().map_err(|e: Error| e.to_string())
}

/// Accepts RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD` taken as UTC.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(format!(
        "'{}' is not a date (expected RFC 3339, YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD)",
        raw
    ))
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Run the parsed command and return its output.
pub async fn run(cli: &Cli) -> Result<String, Error> {
    if let Command::Version = cli.command {
        return Ok(cmd_version());
    }

    let client = NicedayClient::with_config(&cli.client_config())?;
    info!(api_uri = client.api_uri(), "using niceday-api");

    match &cli.command {
        Command::Profile { user_id } => cmd_profile(&client, *user_id).await,
        Command::UserData { user_id } => cmd_user_data(&client, *user_id).await,
        Command::Message { recipient_id, text } => cmd_message(&client, *recipient_id, text).await,
        Command::Trackers {
            user_id,
            tracker,
            disable,
        } => cmd_trackers(&client, *user_id, *tracker, !disable).await,
        Command::Smoking {
            user_id,
            start,
            end,
        } => cmd_smoking(&client, *user_id, *start, *end).await,
        Command::Reminder {
            user_id,
            tracker,
            title,
            freq,
            start,
            until,
            count,
            interval,
        } => {
            let mut rule =
                RecurrenceRule::new(*freq, start.naive_utc()).interval(*interval);
            if let Some(until) = until {
                rule = rule.until(until.naive_utc());
            }
            if let Some(count) = count {
                rule = rule.count(*count);
            }
            cmd_reminder(&client, *user_id, *tracker, title, &rule).await
        }
        Command::Version => Ok(cmd_version()),
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

pub async fn cmd_profile(client: &NicedayClient, user_id: u64) -> Result<String, Error> {
    let profile = client.get_profile(user_id).await?;
    Ok(serde_json::to_string_pretty(&profile)?)
}

pub async fn cmd_user_data(client: &NicedayClient, user_id: u64) -> Result<String, Error> {
    let data = client.user_data(user_id).await?;
    Ok(serde_json::to_string_pretty(&data)?)
}

pub async fn cmd_message(
    client: &NicedayClient,
    recipient_id: u64,
    text: &str,
) -> Result<String, Error> {
    let ack = client.post_message(recipient_id, text).await?;
    info!(recipient_id, "message delivered to niceday-api");
    Ok(format!("Message sent (HTTP {})", ack.status))
}

pub async fn cmd_trackers(
    client: &NicedayClient,
    user_id: u64,
    tracker: Tracker,
    enabled: bool,
) -> Result<String, Error> {
    let ack = client
        .set_user_tracker_statuses(user_id, &[TrackerStatus::for_tracker(tracker, enabled)])
        .await?;
    let state = if enabled { "enabled" } else { "disabled" };
    Ok(format!(
        "Tracker {} {} for user {} (HTTP {})",
        tracker, state, user_id, ack.status
    ))
}

pub async fn cmd_smoking(
    client: &NicedayClient,
    user_id: u64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<String, Error> {
    let entries = client.get_smoking_tracker(user_id, start, end).await?;
    Ok(format!(
        "{}\nTotal quantity: {}",
        serde_json::to_string_pretty(&entries)?,
        total_quantity(&entries)
    ))
}

pub async fn cmd_reminder(
    client: &NicedayClient,
    user_id: u64,
    tracker: Tracker,
    title: &str,
    rule: &RecurrenceRule,
) -> Result<String, Error> {
    let ack = client
        .set_tracker_reminder(user_id, tracker, title, rule)
        .await?;
    Ok(format!(
        "Reminder '{}' scheduled for user {} (HTTP {})\n{}",
        title, user_id, ack.status, rule
    ))
}

pub fn cmd_version() -> String {
    format!("niceday {}", VERSION)
}
