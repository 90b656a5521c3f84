//! Basic Client Example
//!
//! Walks through every niceday-api endpoint for one user.
//!
//! Prerequisites:
//! - niceday-api running on localhost:8080 (or set NICEDAY_API_URI)
//! - A niceday test user; pass its id as the first argument
//!
//! Run with:
//! ```sh
//! cargo run --example basic_client -- 38527
//! ```

use chrono::{Duration, Utc};
use niceday_client::{
    ClientConfig, Error, Frequency, NicedayClient, RecurrenceRule, Tracker, TrackerStatus,
    total_quantity,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let user_id: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(38527);

    let config = ClientConfig::from_env()?;
    let client = NicedayClient::with_config(&config)?;

    println!("=== niceday-client Basic Example ===\n");
    println!("niceday-api: {}", client.api_uri());

    // Step 1: Profile
    println!("\n1. Fetching profile of user {}...", user_id);
    match client.get_profile(user_id).await {
        Ok(profile) => {
            println!("   Name: {:?} {:?}", profile.first_name, profile.last_name);
            println!("   Location: {:?}", profile.location);
        }
        Err(e) => {
            eprintln!("   Failed to fetch profile: {}", e);
            eprintln!("   Make sure niceday-api is running on {}", client.api_uri());
            return Err(e);
        }
    }

    // Step 2: Message
    println!("\n2. Sending a message...");
    let ack = client.post_message(user_id, "Hello world").await?;
    println!("   HTTP {}", ack.status);

    // Step 3: Enable the smoking tracker
    println!("\n3. Enabling the smoking tracker...");
    client
        .set_user_tracker_statuses(user_id, &[TrackerStatus::for_tracker(Tracker::Smoking, true)])
        .await?;

    // Step 4: Last month of smoking registrations
    println!("\n4. Reading the last 30 days of the smoking tracker...");
    let end = Utc::now();
    let entries = client
        .get_smoking_tracker(user_id, end - Duration::days(30), end)
        .await?;
    println!(
        "   {} entries, {} cigarettes",
        entries.len(),
        total_quantity(&entries)
    );

    // Step 5: Daily reminder for the next week
    println!("\n5. Scheduling a daily reminder...");
    let start = end.naive_utc();
    let rule = RecurrenceRule::new(Frequency::Daily, start).until(start + Duration::days(7));
    client
        .set_tracker_reminder(user_id, Tracker::Smoking, "Log your cigarettes", &rule)
        .await?;
    println!("   rrule: {}", rule.to_string().replace('\n', " | "));

    println!("\n=== Example completed successfully ===");
    Ok(())
}
