pub fn mean(data: &[u64]) -> Option<f64> {
    let sum = data.iter().sum::<u64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum as f64 / count as f64),
        _ => None,
    }
}

/// `MM:SS`, truncating sub-second parts. Minutes are not capped at 59.
pub fn format_time(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// `MM:SS.cc` with centiseconds.
pub fn format_time_with_ms(ms: u64) -> String {
    let centis = (ms % 1000) / 10;
    format!("{}.{:02}", format_time(ms), centis)
}

/// `+MM:SS` / `-MM:SS` for signed durations such as the OMR buffer.
pub fn format_signed_time(ms: i64) -> String {
    let sign = if ms >= 0 { '+' } else { '-' };
    format!("{}{}", sign, format_time(ms.unsigned_abs()))
}

/// Seconds with one decimal, e.g. `72.4s`.
pub fn format_secs(ms: f64) -> String {
    format!("{:.1}s", ms / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10, 20, 30, 15, 22]), Some(19.4));
        assert_eq!(mean(&[50_000, 90_000]), Some(70_000.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59_999), "00:59");
        assert_eq!(format_time(61_000), "01:01");
        assert_eq!(format_time(180 * 60_000), "180:00");
    }

    #[test]
    fn test_format_time_with_ms() {
        assert_eq!(format_time_with_ms(1_234), "00:01.23");
        assert_eq!(format_time_with_ms(60_005), "01:00.00");
    }

    #[test]
    fn test_format_signed_time() {
        assert_eq!(format_signed_time(90_000), "+01:30");
        assert_eq!(format_signed_time(-20_000), "-00:20");
        assert_eq!(format_signed_time(0), "+00:00");
    }

    #[test]
    fn test_format_secs() {
        assert_eq!(format_secs(72_000.0), "72.0s");
        assert_eq!(format_secs(1_449.0), "1.4s");
    }
}
