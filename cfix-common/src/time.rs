//! Timestamp utilities

use chrono::{DateTime, Local};

/// Format used for the last-processed stamp written onto tracks
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current local timestamp
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Current local time rendered with [`STAMP_FORMAT`]
pub fn stamp() -> String {
    now().format(STAMP_FORMAT).to_string()
}
