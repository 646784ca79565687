use chrono::{DateTime, Local, Utc};

/// Current unix time in milliseconds.
pub fn time_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Local `YYYY-MM-DD HH:MM:SS` rendering of a millisecond timestamp, `-`
/// for zero.
pub fn format_millis(millis: i64) -> String {
    if millis == 0 {
        return "-".to_string();
    }
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(time) => time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "-");
        assert_eq!(format_millis(time_millis()).len(), 19);
        assert!(time_millis() > 1_700_000_000_000);
    }
}
