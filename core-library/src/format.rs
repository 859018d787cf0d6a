//! Display helpers for presenters.

/// Formats a position or duration as `M:SS`.
///
/// Zero, negative, NaN and infinite inputs render as `0:00`. Minutes are not
/// wrapped into hours.
///
/// ```
/// use core_library::format::format_time;
///
/// assert_eq!(format_time(185.7), "3:05");
/// assert_eq!(format_time(f64::NAN), "0:00");
/// ```
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
