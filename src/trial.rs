//! Brute-force trial decoding

use tracing::{info, trace};

use crate::codec::Codec;

/// Try each candidate in order and return the first that decodes `content`
///
/// The order of `candidates` is the preference policy: the first success
/// wins and later candidates are not tried. Every attempt is logged, at
/// `info` level when `verbose` is set. A single pass is made, so `None`
/// means no candidate accepts the content.
pub fn trial_decode<'c>(content: &[u8], candidates: &'c [Codec], verbose: bool) -> Option<&'c Codec> {
    for codec in candidates {
        let success = codec.attempt_decode(content);

        if verbose {
            info!(codec = codec.name(), success, "decode attempt");
        } else {
            trace!(codec = codec.name(), success, "decode attempt");
        }

        if success {
            return Some(codec);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CANDIDATES;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::Registry;

    #[derive(Debug, Clone, PartialEq)]
    struct Attempt {
        level: Level,
        codec: String,
        success: bool,
    }

    /// Collects decode attempt records
    #[derive(Clone, Default)]
    struct AttemptLog(Arc<Mutex<Vec<Attempt>>>);

    #[derive(Default)]
    struct AttemptFields {
        codec: Option<String>,
        success: Option<bool>,
    }

    impl Visit for AttemptFields {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "codec" {
                self.codec = Some(value.to_string());
            }
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            if field.name() == "success" {
                self.success = Some(value);
            }
        }

        fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
    }

    impl<S: Subscriber> Layer<S> for AttemptLog {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = AttemptFields::default();
            event.record(&mut fields);
            if let (Some(codec), Some(success)) = (fields.codec, fields.success) {
                self.0.lock().unwrap().push(Attempt {
                    level: *event.metadata().level(),
                    codec,
                    success,
                });
            }
        }
    }

    fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<Attempt>) {
        let log = AttemptLog::default();
        let subscriber = Registry::default().with(log.clone());
        let result = tracing::subscriber::with_default(subscriber, f);
        let attempts = log.0.lock().unwrap().clone();
        (result, attempts)
    }

    fn detect(content: &[u8]) -> Option<&'static str> {
        trial_decode(content, CANDIDATES, false).map(Codec::name)
    }

    #[test]
    fn test_ascii_wins_first() {
        assert_eq!(detect(b"plain old text\n"), Some("ascii"));
    }

    #[test]
    fn test_empty_content_takes_first_candidate() {
        assert_eq!(detect(b""), Some("ascii"));
    }

    #[test]
    fn test_utf8_without_bom() {
        assert_eq!(detect("naïve café\n".as_bytes()), Some("utf-8"));
    }

    #[test]
    fn test_utf8_with_bom() {
        assert_eq!(detect("\u{feff}naïve\n".as_bytes()), Some("utf-8-sig"));
    }

    #[test]
    fn test_cp1252_only() {
        // Odd length and an isolated lead byte rule out UTF-16/32 and the CJK codecs
        assert_eq!(detect(b"caf\xe9 au lait"), Some("cp1252"));
    }

    #[test]
    fn test_utf16_without_bom() {
        assert_eq!(detect(b"h\x00\xe9\x00"), Some("utf-16"));
    }

    #[test]
    fn test_first_match_not_best_match() {
        // Reads naturally as cp1252, but the even length also decodes as UTF-16
        assert_eq!(detect(b"caf\xe9"), Some("utf-16"));
    }

    #[test]
    fn test_exhausted_candidates() {
        let ascii_only = &CANDIDATES[..1];
        assert!(trial_decode(b"\xff", ascii_only, true).is_none());
        assert!(trial_decode(b"", &[], false).is_none());
    }

    #[test]
    fn test_verbose_reports_every_attempt_at_info() {
        let (found, attempts) =
            capture(|| trial_decode(b"caf\xe9 au lait", CANDIDATES, true).map(Codec::name));
        assert_eq!(found, Some("cp1252"));

        let winner = CANDIDATES.iter().position(|c| c.name() == "cp1252").unwrap();
        assert_eq!(attempts.len(), winner + 1);
        for (attempt, codec) in attempts.iter().zip(CANDIDATES) {
            assert_eq!(attempt.level, Level::INFO);
            assert_eq!(attempt.codec, codec.name());
        }
        assert!(attempts[..winner].iter().all(|a| !a.success));
        assert!(attempts[winner].success);
    }

    #[test]
    fn test_quiet_attempts_stay_at_trace() {
        let (found, attempts) =
            capture(|| trial_decode("naïve\n".as_bytes(), CANDIDATES, false).map(Codec::name));
        assert_eq!(found, Some("utf-8"));

        let codecs: Vec<&str> = attempts.iter().map(|a| a.codec.as_str()).collect();
        assert_eq!(codecs, ["ascii", "utf-8-sig", "utf-8"]);
        assert!(attempts.iter().all(|a| a.level == Level::TRACE));
        assert!(!attempts.iter().any(|a| a.level == Level::INFO));
    }
}
