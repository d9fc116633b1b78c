use chrono::prelude::*;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch.
pub fn create_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_the_epoch| since_the_epoch.as_millis() as u64)
        .unwrap_or(0)
}

pub fn format_timestamp(timestamp: u64) -> String {
    let secs = (timestamp / 1000) as i64;
    let nanos = ((timestamp % 1000) * 1_000_000) as u32;
    match NaiveDateTime::from_timestamp_opt(secs, nanos) {
        Some(naive) => {
            let datetime: DateTime<Utc> = DateTime::from_utc(naive, Utc);
            datetime.format("%H:%M:%S").to_string()
        }
        None => String::from("--:--:--"),
    }
}
