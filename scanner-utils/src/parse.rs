use std::time::Duration;

/// Parse a duration token like `30s`, `15m`, `1h30m`, `1d`, or plain seconds.
///
/// `0` (with or without a unit) is accepted and yields a zero duration, which
/// the cache and cooldown settings treat as "disabled".
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    // Plain seconds may carry a fraction ("2.5"); unit segments may not.
    if let Ok(seconds) = compact.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        return Duration::try_from_secs_f64(seconds).ok();
    }

    let bytes = compact.as_bytes();
    let mut cursor = 0;
    let mut total_seconds = 0_u64;

    while cursor < bytes.len() {
        let number_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }

        if number_start == cursor || cursor == bytes.len() {
            return None;
        }

        let number = compact[number_start..cursor].parse::<u64>().ok()?;
        let multiplier = match bytes[cursor] as char {
            's' | 'S' => 1_u64,
            'm' | 'M' => 60_u64,
            'h' | 'H' => 60_u64 * 60,
            'd' | 'D' => 60_u64 * 60 * 24,
            _ => return None,
        };
        cursor += 1;

        total_seconds = total_seconds.checked_add(number.checked_mul(multiplier)?)?;
    }

    Some(Duration::from_secs(total_seconds))
}
