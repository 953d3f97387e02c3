//! Canonical notification ids.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A ping id in its canonical string form.
///
/// The server generates integer ids while push payloads and the client cache
/// carry strings. Every id crossing that boundary goes through this type so
/// `501`, `"501"` and `" 501 "` all compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Normalize a raw id.
    ///
    /// Surrounding whitespace is dropped and integer ids are rewritten in
    /// their shortest decimal form.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        match trimmed.parse::<i64>() {
            Ok(n) => Self(n.to_string()),
            Err(_) => Self(trimmed.to_string()),
        }
    }

    /// The canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as a server row id, if it is numeric.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// Whether the id is empty after normalization.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<i64> for NotificationId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for NotificationId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for NotificationId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for NotificationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NotificationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl<'de> Deserialize<'de> for NotificationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => NotificationId::from(n),
            Raw::Str(s) => NotificationId::new(s),
        })
    }
}
