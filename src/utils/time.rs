use chrono::{DateTime, Local, Utc};

/// This is the standard way of showing a countdown in checkin: zero padded `MM:SS`.
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Converts a stored moment into user's local time for display.
pub fn format_moment(moment: DateTime<Utc>) -> String {
    moment
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::format_countdown;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(25 * 60), "25:00");
        assert_eq!(format_countdown(12 * 60 + 34), "12:34");
        assert_eq!(format_countdown(5), "00:05");
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(120 * 60), "120:00");
    }
}
