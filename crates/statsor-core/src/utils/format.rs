use chrono::{DateTime, Utc};

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

/// Format an optional string, returning a default if None
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Format a height in centimetres as metres, e.g. `1.82 m`
pub fn format_height(cm: Option<f64>) -> String {
    match cm {
        Some(cm) if cm > 0.0 => format!("{:.2} m", cm / 100.0),
        _ => "-".to_string(),
    }
}

/// Format a timestamp for list output
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Müller-Wohlfahrt", 9), "Müller...");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some("ES"), "-"), "ES");
        assert_eq!(format_optional(Some("  "), "-"), "-");
        assert_eq!(format_optional(None, "n/a"), "n/a");
    }

    #[test]
    fn test_format_height() {
        assert_eq!(format_height(Some(182.0)), "1.82 m");
        assert_eq!(format_height(None), "-");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 0).single().expect("valid");
        assert_eq!(format_timestamp(&ts), "2026-10-18 09:05");
    }
}
