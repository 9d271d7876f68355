// Utility functions
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses an Alpha Vantage "Last Refreshed" timestamp ("2024-01-15 21:05:00").
pub fn parse_refresh_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Formats a price to its 4-decimal display form.
pub fn format_price(value: f64) -> String {
    format!("{value:.4}")
}

/// Formats a percent change to its 2-decimal display form.
pub fn format_change(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_provider_refresh_time() {
        let parsed = parse_refresh_time("2024-01-15 21:05:00").unwrap();
        assert_eq!(parsed.hour(), 21);
        assert_eq!(parsed.minute(), 5);
    }

    #[test]
    fn rejects_garbage_refresh_time() {
        assert!(parse_refresh_time("yesterday-ish").is_none());
    }

    #[test]
    fn price_and_change_display_precision() {
        assert_eq!(format_price(1.085), "1.0850");
        assert_eq!(format_price(1.08507), "1.0851");
        assert_eq!(format_change(0.0), "0.00");
        assert_eq!(format_change(-1.2345), "-1.23");
    }
}
