//! # niceday-client
//!
//! Client for the niceday-api component of the PerfectFit virtual coach.
//!
//! niceday-api is an HTTP service that wraps the Sense/niceday platform.
//! This crate gives typed access to its endpoints.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use niceday_client::{NicedayClient, Tracker, TrackerStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), niceday_client::Error> {
//!     let client = NicedayClient::new("http://localhost:8080/");
//!
//!     let profile = client.get_profile(12345).await?;
//!     println!("Hello {:?}", profile.first_name);
//!
//!     client.post_message(12345, "Hello world").await?;
//!
//!     client
//!         .set_user_tracker_statuses(12345, &[TrackerStatus::for_tracker(Tracker::Smoking, true)])
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Endpoints
//!
//! ```text
//! ┌─────────────────────┐          HTTP           ┌─────────────────────┐
//! │   Your service      │ ◄───────────────────►   │   niceday-api       │
//! │                     │  GET  userdata/{id}     │                     │
//! │  ┌───────────────┐  │  POST messages/         │  ┌───────────────┐  │
//! │  │niceday-client │  │  POST usertrackers/...  │  │ Sense server  │  │
//! │  └───────────────┘  │  GET  usertrackers/...  │  └───────────────┘  │
//! └─────────────────────┘                         └─────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod reminder;
pub mod rrule;

pub use client::{NicedayClient, api_timestamp};
pub use config::{ClientConfig, DEFAULT_API_URI};
pub use error::Error;
pub use model::{
    ApiAck, SmokingTrackerEntry, Tracker, TrackerStatus, TrackerValue, USER_PROFILE_KEYS,
    UserData, UserProfile, total_quantity,
};
pub use reminder::{RecurringSchedule, ReminderMargin};
pub use rrule::{Frequency, RecurrenceRule};

/// Version of this crate. Release tags are `v` followed by this value.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
