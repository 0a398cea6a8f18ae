use std::time::Duration;

/// Render a cooldown denial the way it is shown to requesters (e.g. "try again in 12.5s").
pub fn format_retry_after(remaining: Duration) -> String {
    format!("try again in {:.1}s", remaining.as_secs_f64())
}

/// Format a duration into a compact human-readable form (e.g. 59s, 1m, 1h 30m, 1d).
pub fn format_compact_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let parts: Vec<String> = [(days, 'd'), (hours, 'h'), (minutes, 'm'), (seconds, 's')]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "0s".to_owned()
    } else {
        parts.join(" ")
    }
}

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Like [`truncate_chars`] but appends `...` when something was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let cut = truncate_chars(text, max_chars);
    if cut.len() < text.len() {
        format!("{}...", cut)
    } else {
        cut.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{format_compact_duration, format_retry_after, preview, truncate_chars};

    #[test]
    fn retry_hint_has_one_decimal() {
        assert_eq!(
            format_retry_after(Duration::from_millis(12_540)),
            "try again in 12.5s"
        );
        assert_eq!(format_retry_after(Duration::ZERO), "try again in 0.0s");
    }

    #[test]
    fn compact_duration_formatting() {
        assert_eq!(format_compact_duration(Duration::ZERO), "0s");
        assert_eq!(format_compact_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_compact_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_compact_duration(Duration::from_secs(300)), "5m");
        assert_eq!(format_compact_duration(Duration::from_secs(3670)), "1h 1m 10s");
        assert_eq!(format_compact_duration(Duration::from_secs(90000)), "1d 1h");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 2), "he");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
    }
}
