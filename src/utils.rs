use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

pub(crate) const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Characters escaped inside a single URL path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Exponential backoff with up to 50% jitter, capped at [`MAX_BACKOFF`].
pub(crate) fn jittered_delay(initial: Duration, attempt: u32) -> Duration {
    let base_ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX);
    let backoff_multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let base = base_ms.saturating_mul(backoff_multiplier);

    let jitter_upper_bound = base / 2;
    let jitter = if jitter_upper_bound == 0 {
        0
    } else {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        let mut hasher = DefaultHasher::new();
        attempt.hash(&mut hasher);
        nanos.hash(&mut hasher);
        hasher.finish() % jitter_upper_bound
    };

    let max_ms = u64::try_from(MAX_BACKOFF.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(base.saturating_add(jitter).min(max_ms))
}

/// Parse a `Retry-After` header given in seconds. HTTP-date values are ignored.
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs).min(MAX_BACKOFF))
}

/// Escape a resource id or other caller-provided value for use in a path.
pub(crate) fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_delay_bounds() {
        let initial = Duration::from_millis(100);
        for attempt in 0..8 {
            let base = 100 * 2u64.pow(attempt);
            let delay = jittered_delay(initial, attempt);
            assert!(delay >= Duration::from_millis(base));
            assert!(delay <= Duration::from_millis(base + (base / 2)));
        }
    }

    #[test]
    fn test_jittered_delay_max_cap() {
        let delay = jittered_delay(Duration::from_secs(1), 20);
        assert!(delay <= MAX_BACKOFF);
    }

    #[test]
    fn test_jittered_delay_handles_overflow_safely() {
        let delay = jittered_delay(Duration::from_secs(u64::MAX), u32::MAX);
        assert_eq!(delay, MAX_BACKOFF);
    }

    #[test]
    fn test_jittered_delay_zero_initial() {
        assert_eq!(jittered_delay(Duration::ZERO, 3), Duration::ZERO);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(" 0.5 "), Some(Duration::from_millis(500)));
        assert_eq!(parse_retry_after("3600"), Some(MAX_BACKOFF));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
        assert_eq!(parse_retry_after("-1"), None);
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("cus_123"), "cus_123");
        assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_path_segment("ext?id#1"), "ext%3Fid%231");
    }
}
