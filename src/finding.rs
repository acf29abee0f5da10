//! Backend-independent representation of one reported issue.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodegateError;
use crate::location::Location;

/// Priority of a finding. Lower levels are more severe, so the natural
/// ordering puts `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    High = 1,
    MediumHigh = 2,
    Medium = 3,
    MediumLow = 4,
    #[default]
    Low = 5,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::High,
        Severity::MediumHigh,
        Severity::Medium,
        Severity::MediumLow,
        Severity::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::MediumHigh => "medium-high",
            Severity::Medium => "medium",
            Severity::MediumLow => "medium-low",
            Severity::Low => "low",
        }
    }

    /// Numeric level, 1 (most severe) to 5.
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Severity::ALL.into_iter().find(|s| s.level() == level)
    }

    /// True when `self` is less severe than `threshold`.
    #[must_use]
    pub fn is_below(self, threshold: Severity) -> bool {
        self > threshold
    }
}

impl FromStr for Severity {
    type Err = CodegateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        if let Ok(level) = normalized.parse::<u8>() {
            return Severity::from_level(level)
                .ok_or_else(|| CodegateError::Parse(format!("Severity level out of range: {s}")));
        }
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == normalized)
            .ok_or_else(|| {
                CodegateError::Parse(format!(
                    "Unknown severity: '{s}'. Supported: high, medium-high, medium, medium-low, low"
                ))
            })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeverityRepr {
    Level(u8),
    Name(String),
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match SeverityRepr::deserialize(deserializer)? {
            SeverityRepr::Level(level) => Severity::from_level(level)
                .ok_or_else(|| de::Error::custom(format!("severity level out of range: {level}"))),
            SeverityRepr::Name(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

/// One issue reported by a backend, projected into the common shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub location: Location,
    /// Backend-defined issue code, compared case-sensitively.
    pub code: String,
    pub severity: Severity,
    /// Secondary severity axis; higher is more important.
    #[serde(default)]
    pub rank: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Finding {
    pub fn new(location: Location, code: impl Into<String>, severity: Severity) -> Self {
        Self {
            location,
            code: code.into(),
            severity,
            rank: 0,
            message: String::new(),
        }
    }

    #[must_use]
    pub fn with_rank(mut self, rank: i32) -> Self {
        self.rank = rank;
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn group(&self) -> &str {
        self.location.group()
    }
}
