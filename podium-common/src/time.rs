//! Race time formatting

/// Format a race time in milliseconds for display
///
/// Inverse of the import time normalizer: `M:SS.mmm` below one hour,
/// `H:MM:SS.mmm` above it.
pub fn format_race_time(millis: i64) -> String {
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();

    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    let seconds = (millis % 60_000) / 1000;
    let fraction = millis % 1000;

    if hours > 0 {
        format!("{}{}:{:02}:{:02}.{:03}", sign, hours, minutes, seconds, fraction)
    } else {
        format!("{}{}:{:02}.{:03}", sign, minutes, seconds, fraction)
    }
}
