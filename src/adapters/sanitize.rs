//! Log sanitization for personal details.
//!
//! Symptom descriptions, notes and uploaded documents are free text and may
//! carry identifying details. Everything written through
//! [`SanitizingMakeWriter`] is scrubbed of:
//! - Record identifiers (UUIDs)
//! - Email addresses and phone numbers
//! - Calendar dates (birth dates, injury dates)
//! - SSN-like numbers
//!
//! Log output is capped per line; the cap comes from `AppConfig::sanitize_max_bytes`.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PII_PATTERNS: OnceLock<PiiPatterns> = OnceLock::new();

/// Default cap on bytes sanitized per call (16 KiB).
pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct PiiPattern {
    regex: Regex,
    replacement: &'static str,
}

struct PiiPatterns {
    set: RegexSet,
    patterns: Vec<PiiPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn get_patterns() -> &'static PiiPatterns {
    PII_PATTERNS.get_or_init(|| {
        // Applied in order; SSN must run before phone.
        let rules: [(&'static str, &'static str); 6] = [
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (r"\b\d{3}-\d{2}-\d{4}\b", "[REDACTED-SSN]"),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b",
                "[REDACTED-PHONE]",
            ),
            // ISO dates; RFC 3339 log timestamps have no boundary before the 'T'
            (r"\b\d{4}-\d{2}-\d{2}\b", "[REDACTED-DATE]"),
            (r"\b\d{1,2}/\d{1,2}/\d{2,4}\b", "[REDACTED-DATE]"),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| PiiPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        PiiPatterns { set, patterns }
    })
}

/// Replace personal details in `input`, keeping at most `max_bytes` of it.
#[must_use]
pub fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log lines
/// before they reach the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    /// Wrap `inner`, sanitizing at most `max_bytes` of each line.
    #[must_use]
    pub fn with_limit(inner: M, max_bytes: usize) -> Self {
        Self {
            inner,
            max_bytes: max_bytes.max(1),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        let sanitized = sanitize_with_limit(&text, self.max_bytes);
        self.inner.write_all(sanitized.as_bytes())?;
        if text.ends_with('\n') && !sanitized.ends_with('\n') {
            self.inner.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A single line larger than twice the cap is flushed as-is (truncated).
        if self.buffer.len() > self.max_bytes.saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
            max_bytes: self.max_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn sanitize(input: &str) -> String {
        sanitize_with_limit(input, DEFAULT_SANITIZE_MAX_BYTES)
    }

    #[test]
    fn test_sanitize_uuid() {
        let sanitized = sanitize("Saved symptom 550e8400-e29b-41d4-a716-446655440000 to storage");
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(!sanitized.contains("550e8400"));
    }

    #[test]
    fn test_sanitize_contact_details() {
        let sanitized = sanitize("Call me on 555-123-4567 or mail jo.doe@example.org");
        assert!(sanitized.contains("[REDACTED-PHONE]"));
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
        assert!(!sanitized.contains("example.org"));
    }

    #[test]
    fn test_sanitize_ssn_before_phone() {
        assert_eq!(sanitize("SSN: 123-45-6789"), "SSN: [REDACTED-SSN]");
    }

    #[test]
    fn test_sanitize_dates() {
        let sanitized = sanitize("Injured 2024-03-18, born 4/7/1990");
        assert_eq!(sanitized, "Injured [REDACTED-DATE], born [REDACTED-DATE]");
    }

    #[test]
    fn test_log_timestamps_survive() {
        let line = "2024-03-18T09:15:02.123456Z  INFO headway: Analysis complete";
        assert_eq!(sanitize(line), line);
    }

    #[test]
    fn test_plain_symptom_text_untouched() {
        let line = "Headache and nausea since Monday";
        assert_eq!(sanitize(line), line);
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let sanitized = sanitize_with_limit("dizzy ⚠️ spells", 8);
        assert!(sanitized.ends_with(" [TRUNCATED]"));
        assert!(sanitized.starts_with("dizzy "));
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("Lock failed").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_writer_sanitizes_lines() {
        let capture = Capture::default();
        let make_writer = SanitizingMakeWriter::with_limit(capture.clone(), 1024);

        let mut writer = make_writer.make_writer();
        writer.write_all(b"contact jo@example.org\npartial ").expect("Should write");
        writer.write_all(b"line\n").expect("Should write");
        writer.flush().expect("Should flush");

        let written = String::from_utf8(capture.0.lock().expect("Lock failed").clone())
            .expect("Should be UTF-8");
        assert_eq!(written, "contact [REDACTED-EMAIL]\npartial line\n");
    }

    #[test]
    fn test_writer_uses_configured_limit() {
        let capture = Capture::default();
        let make_writer = SanitizingMakeWriter::with_limit(capture.clone(), 8);

        let mut writer = make_writer.make_writer();
        writer.write_all(b"headache since monday\n").expect("Should write");
        writer.flush().expect("Should flush");

        let written = String::from_utf8(capture.0.lock().expect("Lock failed").clone())
            .expect("Should be UTF-8");
        assert_eq!(written, "headache [TRUNCATED]\n");
    }
}
