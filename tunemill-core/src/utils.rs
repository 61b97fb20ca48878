//! Small formatting helpers shared by the renderer and the CLI summary.

use std::time::Duration;

/// Formats a duration as "XhYmZs".
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Formats a duration as a compact "MM:SS" (or "H:MM:SS") clock, as shown in
/// the progress stats line.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_duration(Duration::from_secs(61)), "0h 1m 1s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
        assert_eq!(
            format_duration(Duration::from_secs(3600 * 2 + 60 * 30 + 15)),
            "2h 30m 15s"
        );
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_secs(59)), "00:59");
        assert_eq!(format_clock(Duration::from_secs(125)), "02:05");
        assert_eq!(format_clock(Duration::from_secs(3725)), "1:02:05");
    }
}
