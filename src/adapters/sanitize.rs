//! Log sanitization for raw patient identifiers.
//!
//! External responses only ever carry anonymized identifiers; this keeps the
//! log stream to the same rule. The formatted output of every log line is
//! scanned and the following are replaced:
//! - Raw roster identifiers (`P001`, `PAT-00042`)
//! - Medical record numbers (`MRN:1234567`)
//! - UUIDs
//! - NHS-number-like digit groups (`943 476 5919`)
//!
//! Anonymized identifiers (16 lowercase hex chars) pass through untouched.
//!
//! Lines longer than `MAX_SANITIZE_BYTES` are truncated before scanning.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

const MAX_SANITIZE_BYTES: usize = 16 * 1024;

const RULES: [(&str, &str); 4] = [
    (r"\bP(?:AT)?-?\d{3,10}\b", "[REDACTED-PATIENT]"),
    (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
    (
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        "[REDACTED-UUID]",
    ),
    (r"\b\d{3}[ -]\d{3}[ -]\d{4}\b", "[REDACTED-NHS]"),
];

struct Patterns {
    set: RegexSet,
    rules: Vec<(Regex, &'static str)>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        set: RegexSet::new(RULES.iter().map(|(p, _)| *p)).expect("Valid regex set"),
        rules: RULES
            .iter()
            .map(|(p, r)| (Regex::new(p).expect("Valid regex"), *r))
            .collect(),
    })
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

/// Replace identifying patterns in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, MAX_SANITIZE_BYTES)
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let (regex, replacement) = &patterns.rules[idx];
        result = regex.replace_all(&result, *replacement).into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// before it reaches the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let sanitized = sanitize(&String::from_utf8_lossy(bytes));
        self.inner.write_all(sanitized.as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter that never emits a newline must not grow the buffer forever.
        if self.buffer.len() > MAX_SANITIZE_BYTES * 2 {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
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

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
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
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_roster_ids() {
        let sanitized = sanitize("Scored P001 and PAT-00042 from ICU");
        assert_eq!(sanitized, "Scored [REDACTED-PATIENT] and [REDACTED-PATIENT] from ICU");
    }

    #[test]
    fn test_anonymized_ids_pass_through() {
        let input = "patient=ba7816bf8f01cfea level=HIGH";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn test_sanitize_mrn_and_uuid() {
        let sanitized = sanitize("MRN:12345678 id 550e8400-e29b-41d4-a716-446655440000");
        assert!(sanitized.contains("[REDACTED-MRN]"));
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(!sanitized.contains("550e8400"));
    }

    #[test]
    fn test_sanitize_nhs_number() {
        assert_eq!(sanitize("NHS 943 476 5919"), "NHS [REDACTED-NHS]");
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let sanitized = sanitize_with_limit("prefix P001 suffix", 8);
        assert!(sanitized.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter {
                inner: &mut sink,
                buffer: Vec::new(),
            };
            writer.write_all(b"first P002\nsecond ").expect("write");
            writer.write_all(b"P003\n").expect("write");
        }
        assert_eq!(
            String::from_utf8(sink).expect("utf8"),
            "first [REDACTED-PATIENT]\nsecond [REDACTED-PATIENT]\n"
        );
    }
}
