//! Parsed log records
//!
//! Producers write each entry as `"[<timestamp>] <content>"`. Parsing splits
//! on the first `]`; text without one is rejected as a whole.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShmLogError};

/// One parsed log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub content: String,
}

impl LogRecord {
    pub fn new(timestamp: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            content: content.into(),
        }
    }

    /// Parse a decoded slot text
    pub fn parse(text: &str) -> Result<Self> {
        let close = text.find(']').ok_or_else(|| ShmLogError::parse(text))?;

        // Timestamp starts after the first character (the opening bracket).
        // A leading `]` leaves no bracket to close, so it runs to the end.
        let timestamp = match text.char_indices().nth(1) {
            Some((start, _)) if close == 0 => &text[start..],
            Some((start, _)) => &text[start..close],
            None => "",
        };

        // Content starts two characters after the bracket, skipping the separator
        let after = &text[close + 1..];
        let content = match after.char_indices().nth(1) {
            Some((skip, _)) => &after[skip..],
            None => "",
        };

        Ok(Self::new(timestamp.trim(), content.trim()))
    }
}

/// Records parsed from one batch of slot texts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBatch {
    /// Successfully parsed records, in slot order
    pub records: Vec<LogRecord>,
    /// Texts that failed to parse
    pub failures: usize,
}

/// Parse every text, dropping the malformed ones individually
pub fn parse_batch<I, S>(texts: I) -> ParsedBatch
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut batch = ParsedBatch::default();
    for text in texts {
        match LogRecord::parse(text.as_ref()) {
            Ok(record) => batch.records.push(record),
            Err(err) => {
                log::debug!("Dropping record: {}", err);
                batch.failures += 1;
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_line() {
        let record = LogRecord::parse("[2024-01-01 10:00:00] hello world").unwrap();
        assert_eq!(record.timestamp, "2024-01-01 10:00:00");
        assert_eq!(record.content, "hello world");
    }

    #[test]
    fn test_parse_trims_fields() {
        let record = LogRecord::parse("[  12:00:01 ]   spaced out  ").unwrap();
        assert_eq!(record.timestamp, "12:00:01");
        assert_eq!(record.content, "spaced out");
    }

    #[test]
    fn test_parse_missing_bracket_fails() {
        let err = LogRecord::parse("malformed entry").unwrap_err();
        assert!(matches!(err, ShmLogError::Parse { .. }));
    }

    #[test]
    fn test_parse_uses_first_bracket() {
        let record = LogRecord::parse("[t] value [nested] text").unwrap();
        assert_eq!(record.timestamp, "t");
        assert_eq!(record.content, "value [nested] text");
    }

    #[test]
    fn test_parse_edges() {
        let record = LogRecord::parse("[ts]").unwrap();
        assert_eq!(record, LogRecord::new("ts", ""));

        let record = LogRecord::parse("]leading").unwrap();
        assert_eq!(record.timestamp, "leading");
        assert_eq!(record.content, "eading");

        assert_eq!(LogRecord::parse("]").unwrap(), LogRecord::new("", ""));

        // Separator need not be a space; one character is always skipped
        let record = LogRecord::parse("[ts]:x").unwrap();
        assert_eq!(record.content, "x");
    }

    #[test]
    fn test_parse_non_ascii() {
        let record = LogRecord::parse("[d\u{e9}j\u{e0}] caf\u{e9}").unwrap();
        assert_eq!(record.timestamp, "d\u{e9}j\u{e0}");
        assert_eq!(record.content, "caf\u{e9}");
    }

    #[test]
    fn test_parse_batch_drops_individually() {
        let batch = parse_batch(["[a] one", "malformed entry", "[b] two"]);
        assert_eq!(
            batch.records,
            vec![LogRecord::new("a", "one"), LogRecord::new("b", "two")]
        );
        assert_eq!(batch.failures, 1);
    }
}
