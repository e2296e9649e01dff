pub mod time;

pub use time::{format_kolkata, kolkata_timestamp};
