//! Duration parsing utilities.
//!
//! Parses the short duration strings accepted on the command line
//! (e.g. "500ms", "10s", "2m") into [`Duration`]s.

use std::time::Duration;

/// Parse a duration string such as "500ms", "10s", "2m" or "1h".
///
/// Supports:
/// - Raw seconds: "30"
/// - Milliseconds: "500ms", "500msec", "500millis"
/// - Seconds: "30s", "30sec", "30secs", "30second", "30seconds"
/// - Minutes: "2m", "2min", "2mins", "2minute", "2minutes"
/// - Hours: "1h", "1hr", "1hrs", "1hour", "1hours"
///
/// # Examples
/// ```
/// use breachnet::utils::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
/// assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
/// assert!(parse_duration("soon").is_err());
/// ```
pub fn parse_duration(duration: &str) -> Result<Duration, String> {
    let duration = duration.trim();
    let (number, unit) = split_number_part(duration);
    if number.is_empty() {
        return Err(format!("Invalid duration format: {}", duration));
    }
    let value = number
        .parse::<u64>()
        .map_err(|_| format!("Invalid duration format: {}", duration))?;

    // Longer suffixes are listed before their prefixes
    let millis_per_unit = match unit {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1_000,
        "ms" | "msec" | "millis" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000,
        _ => return Err(format!("Invalid duration format: {}", duration)),
    };

    value
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("Duration out of range: {}", duration))
}

/// Split a duration string at the first non-digit character.
fn split_number_part(duration: &str) -> (&str, &str) {
    let end = duration
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(duration.len());
    (&duration[..end], duration[end..].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("30seconds"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("2mins"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_duration(" 5 s "), Ok(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("5minutesx").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("18446744073709551615h").is_err());
    }
}
