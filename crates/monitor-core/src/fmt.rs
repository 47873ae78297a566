//! Shared formatting helpers for sample output.
//!
//! All pure formatting functions (no I/O) live here so that plain and CSV
//! rendering agree on how numbers and timestamps look.

use chrono::NaiveDateTime;

/// Unit suffixes for [`format_size`], in powers of 1024.
const SCALES: [&str; 5] = ["", "K", "M", "G", "T"];

/// Timestamp layout shared by plain and CSV output (millisecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Format a byte count with binary scaling and two decimals.
///
/// `0` → `"0.00"`, `1536` → `"1.50K"`, `8804682956.8` → `"8.20G"`.
/// Values past the tebibyte range stay in `T`.
pub fn format_size(num: f64) -> String {
    let mut value = num;
    let last = SCALES.len() - 1;
    for (i, suffix) in SCALES.iter().enumerate() {
        if value.abs() < 1024.0 || i == last {
            return format!("{:4.2}{}", value, suffix);
        }
        value /= 1024.0;
    }
    unreachable!("loop returns on the last scale")
}

/// Format a float in shortest round-trip form, always with a decimal point.
///
/// `42.0` → `"42.0"`, `0.75` → `"0.75"`.
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') && !text.contains('e') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Format a local timestamp as `YYYY-MM-DD HH:MM:SS.mmm`.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_size_scales() {
        assert_eq!(format_size(0.0), "0.00");
        assert_eq!(format_size(1023.0), "1023.00");
        assert_eq!(format_size(1024.0), "1.00K");
        assert_eq!(format_size(1536.0), "1.50K");
        assert_eq!(format_size(1024f64.powi(2) * 3.0), "3.00M");
        assert_eq!(format_size(1024f64.powi(3)), "1.00G");
        assert_eq!(format_size(8.2 * 1024f64.powi(3)), "8.20G");
    }

    #[test]
    fn test_format_size_clamps_at_tebibytes() {
        assert_eq!(format_size(1024f64.powi(4)), "1.00T");
        assert_eq!(format_size(2048.0 * 1024f64.powi(4)), "2048.00T");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(42.0), "42.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(0.75), "0.75");
        assert_eq!(format_float(12.34), "12.34");
    }

    #[test]
    fn test_format_timestamp_millis() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_milli_opt(9, 5, 1, 42)
            .unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-07 09:05:01.042");
    }
}
