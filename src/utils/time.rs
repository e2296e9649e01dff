use chrono::{DateTime, FixedOffset, Utc};

/// Asia/Kolkata is UTC+05:30 all year round.
const KOLKATA_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

pub fn format_kolkata(time: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(KOLKATA_OFFSET_SECS) {
        Some(offset) => time.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string(),
        None => time.format(TIMESTAMP_FORMAT).to_string(),
    }
}

pub fn kolkata_timestamp() -> String {
    format_kolkata(Utc::now())
}
