//! Ping lifecycle status and the tick marks rendered for it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a ping.
///
/// The only transition is `Sent -> Read`, and it happens at most once.
/// Delivery to the device is never confirmed, so there is no "delivered" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
pub enum PingStatus {
    /// Stored on the server and handed to the push gateway.
    Sent,
    /// Marked read by the recipient.
    Read,
}

impl PingStatus {
    /// The wire/storage form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PingStatus::Sent => "sent",
            PingStatus::Read => "read",
        }
    }
}

impl fmt::Display for PingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known ping status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ping status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for PingStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sent" => Ok(PingStatus::Sent),
            "read" => Ok(PingStatus::Read),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// The tick shown next to a sent ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMark {
    /// One tick: the ping was sent.
    Single,
    /// Two ticks: the recipient read the ping.
    Double,
}

impl TickMark {
    /// Text glyph for the mark.
    pub fn glyph(&self) -> &'static str {
        match self {
            TickMark::Single => "✓",
            TickMark::Double => "✓✓",
        }
    }
}

/// Map a stored status string to the tick it renders as.
///
/// Total over every input: unrecognized statuses render no mark.
pub fn tick_mark(status: &str) -> Option<TickMark> {
    match status.parse::<PingStatus>() {
        Ok(PingStatus::Sent) => Some(TickMark::Single),
        Ok(PingStatus::Read) => Some(TickMark::Double),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [PingStatus::Sent, PingStatus::Read] {
            assert_eq!(status.as_str().parse::<PingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PingStatus::Read).unwrap(), "\"read\"");
        let parsed: PingStatus = serde_json::from_str("\"sent\"").unwrap();
        assert_eq!(parsed, PingStatus::Sent);
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        let err = "delivered".parse::<PingStatus>().unwrap_err();
        assert_eq!(err.0, "delivered");
    }

    #[test]
    fn test_tick_mark_is_total() {
        assert_eq!(tick_mark("sent"), Some(TickMark::Single));
        assert_eq!(tick_mark("read"), Some(TickMark::Double));
        assert_eq!(tick_mark(""), None);
        assert_eq!(tick_mark("READ!"), None);
        assert_eq!(tick_mark("delivered"), None);
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(TickMark::Single.glyph(), "✓");
        assert_eq!(TickMark::Double.glyph(), "✓✓");
    }
}
