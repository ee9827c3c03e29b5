use chrono::{DateTime, Local, Utc};

use chatline_core::{Notification, Severity};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a timestamp in local time for listings
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// One line per notification, prefixed by its severity
pub fn format_notification(n: &Notification) -> String {
    let label = match n.severity {
        Severity::Error => "error",
        Severity::Success => "ok",
        Severity::Info => "info",
        Severity::Warning => "warning",
    };
    format!("[{}] {}", label, n.message)
}
