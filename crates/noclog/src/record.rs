// Copyright 2025-Present the noclog authors
// SPDX-License-Identifier: Apache-2.0

//! Structured log records and the tag-convention parser.
//!
//! Devices prefix each message with a comma-delimited tag header, where the
//! second token names the severity:
//!
//! ```text
//! network,critical,interface eth0 down
//! └──┬──┘ └───┬──┘ └───┬───┘ └───┬───┘
//!  topic  severity  topic     free text
//! ```
//!
//! Anything that does not match the convention (no whitespace, or fewer than
//! two comma tokens before the first whitespace) is kept verbatim as an
//! `unknown`-category record rather than dropped.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};

/// Syslog severity ordinals (RFC 5424 scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    /// Maps a severity keyword from the tag header. Case-sensitive; the
    /// device-side convention emits lowercase tokens only.
    ///
    /// `packet` and `raw` are firewall logging topics that carry
    /// debug-volume traffic, so they map to [`Severity::Debug`].
    #[must_use]
    pub fn from_keyword(token: &str) -> Option<Severity> {
        match token {
            "fatal" | "emergency" => Some(Severity::Emergency),
            "alert" => Some(Severity::Alert),
            "critical" => Some(Severity::Critical),
            "error" => Some(Severity::Error),
            "warning" => Some(Severity::Warning),
            "notice" => Some(Severity::Notice),
            "info" => Some(Severity::Info),
            "debug" | "packet" | "raw" => Some(Severity::Debug),
            _ => None,
        }
    }

    /// Numeric ordinal as stored in the `severity` column (`Enum8`).
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Emergency => "emergency",
            Severity::Alert => "alert",
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
        };
        write!(f, "{}", name)
    }
}

/// One parsed log line. Immutable after construction; moved into the queue
/// and consumed exactly once by the batcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Capture time, assigned at parse time (not extracted from the message).
    pub timestamp: DateTime<Utc>,
    /// `addr:port` of the sending peer.
    pub origin: String,
    pub severity: Severity,
    /// Ordered free-text tags; never empty. Duplicates are kept as sent.
    pub categories: Vec<String>,
    /// Remaining free-text payload.
    pub message: String,
}

/// Parses one datagram payload into a [`LogRecord`].
///
/// Never fails: input that does not carry the tag convention comes back as a
/// best-effort record with `severity = Info`, `categories = ["unknown"]` and
/// the untouched payload as the message.
#[must_use]
pub fn parse(raw: &str, origin: SocketAddr) -> LogRecord {
    let timestamp = Utc::now();
    let origin = origin.to_string();

    // Arity first: the remainder only exists if a whitespace split exists.
    let Some((header, message)) = raw.split_once(char::is_whitespace) else {
        return fallback(raw, origin, timestamp);
    };

    let topics: Vec<&str> = header.split(',').collect();
    if topics.len() < 2 {
        return fallback(raw, origin, timestamp);
    }

    // topics[1] is the severity token; everything else is a category.
    let mut categories = Vec::with_capacity(topics.len());
    categories.push(topics[0].to_string());
    categories.extend(topics[2..].iter().map(|t| (*t).to_string()));

    let severity = match Severity::from_keyword(topics[1]) {
        Some(severity) => severity,
        None => {
            // Unknown keyword: keep it as a tag instead of dropping it.
            categories.push(topics[1].to_string());
            Severity::Info
        }
    };

    LogRecord {
        timestamp,
        origin,
        severity,
        categories,
        message: message.to_string(),
    }
}

fn fallback(raw: &str, origin: String, timestamp: DateTime<Utc>) -> LogRecord {
    LogRecord {
        timestamp,
        origin,
        severity: Severity::Info,
        categories: vec!["unknown".to_string()],
        message: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn origin() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), 514)
    }

    #[test]
    fn test_parse_structured_message() {
        let record = parse("network,critical,interface eth0 down", origin());

        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.categories, vec!["network", "interface"]);
        assert_eq!(record.message, "eth0 down");
        assert_eq!(record.origin, "10.0.0.5:514");
    }

    #[test]
    fn test_parse_no_whitespace_falls_back() {
        let raw = "no-whitespace-at-all";
        let record = parse(raw, origin());

        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.categories, vec!["unknown"]);
        assert_eq!(record.message, raw);
    }

    #[test]
    fn test_parse_single_tag_header_falls_back() {
        let record = parse("justonetag some message", origin());

        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.categories, vec!["unknown"]);
        assert_eq!(record.message, "justonetag some message");
    }

    #[test]
    fn test_parse_unknown_severity_token_kept_as_category() {
        let record = parse("a,b c", origin());

        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.categories, vec!["a", "b"]);
        assert_eq!(record.message, "c");
    }

    #[test]
    fn test_parse_multi_topic_message() {
        let record = parse("x,debug,y,z payload here", origin());

        assert_eq!(record.severity, Severity::Debug);
        assert_eq!(record.categories, vec!["x", "y", "z"]);
        assert_eq!(record.message, "payload here");
    }

    #[test]
    fn test_parse_empty_input() {
        let record = parse("", origin());

        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.categories, vec!["unknown"]);
        assert_eq!(record.message, "");
    }

    #[test]
    fn test_parse_garbage_does_not_panic() {
        for raw in ["", " ", ",", ", ", " ,", ",, ,,", "\u{fffd}\u{fffd} x", "a,b "] {
            let record = parse(raw, origin());
            assert!(!record.categories.is_empty());
        }
    }

    #[test]
    fn test_parse_trailing_space_keeps_empty_message() {
        let record = parse("system,info,account ", origin());

        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.categories, vec!["system", "account"]);
        assert_eq!(record.message, "");
    }

    #[test]
    fn test_severity_keyword_table() {
        let cases = [
            ("fatal", Severity::Emergency),
            ("emergency", Severity::Emergency),
            ("alert", Severity::Alert),
            ("critical", Severity::Critical),
            ("error", Severity::Error),
            ("warning", Severity::Warning),
            ("notice", Severity::Notice),
            ("info", Severity::Info),
            ("debug", Severity::Debug),
            ("packet", Severity::Debug),
            ("raw", Severity::Debug),
        ];
        for (token, expected) in cases {
            assert_eq!(Severity::from_keyword(token), Some(expected), "{token}");
        }

        // Case-sensitive by design.
        assert_eq!(Severity::from_keyword("Error"), None);
        assert_eq!(Severity::from_keyword("CRITICAL"), None);
        assert_eq!(Severity::from_keyword("unheard-of"), None);
    }

    #[test]
    fn test_severity_ordinals() {
        assert_eq!(Severity::Emergency.as_u8(), 0);
        assert_eq!(Severity::Alert.as_u8(), 1);
        assert_eq!(Severity::Critical.as_u8(), 2);
        assert_eq!(Severity::Error.as_u8(), 3);
        assert_eq!(Severity::Warning.as_u8(), 4);
        assert_eq!(Severity::Notice.as_u8(), 5);
        assert_eq!(Severity::Info.as_u8(), 6);
        assert_eq!(Severity::Debug.as_u8(), 7);
    }

    #[test]
    fn test_duplicate_topics_are_kept() {
        let record = parse("fw,warning,fw,fw drop tcp", origin());

        assert_eq!(record.severity, Severity::Warning);
        assert_eq!(record.categories, vec!["fw", "fw", "fw"]);
        assert_eq!(record.message, "drop tcp");
    }
}
