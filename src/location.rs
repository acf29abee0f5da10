//! Where a finding or coverage sample comes from, and the wildcard patterns
//! used to select locations.
//!
//! Pattern grammar (deliberately tiny, no regex):
//!   `*`        any value
//!   `Name`     exactly `Name`
//!   `Name*`    values starting with `Name`
//!   `*Name`    values ending with `Name`
//!
//! A matcher string is `container[#member]`, e.g. `com.acme.*` or
//! `com.acme.Parser#parse*`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodegateError, Result};

/// Structured identifier of where something happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Fully qualified container, e.g. `com.acme.Parser`.
    pub container: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Location {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            member: None,
            file: None,
            line: None,
        }
    }

    #[must_use]
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>, line: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }

    /// The enclosing group of the container: everything before the last `.`,
    /// or the empty string for a top-level container.
    #[must_use]
    pub fn group(&self) -> &str {
        self.container
            .rsplit_once('.')
            .map_or("", |(group, _)| group)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.container)?;
        if let Some(member) = &self.member {
            write!(f, "#{member}")?;
        }
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, " ({file}:{line})"),
            (Some(file), None) => write!(f, " ({file})"),
            _ => Ok(()),
        }
    }
}

/// A single wildcard pattern over one string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
}

impl Pattern {
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(CodegateError::Pattern("empty pattern".to_string()));
        }
        if s == "*" {
            return Ok(Pattern::Any);
        }
        if let Some(rest) = s.strip_prefix('*') {
            if !rest.contains('*') {
                return Ok(Pattern::Suffix(rest.to_string()));
            }
        } else if let Some(head) = s.strip_suffix('*') {
            if !head.contains('*') {
                return Ok(Pattern::Prefix(head.to_string()));
            }
        } else if !s.contains('*') {
            return Ok(Pattern::Exact(s.to_string()));
        }
        Err(CodegateError::Pattern(format!(
            "'{s}': '*' is only allowed once, at the start or the end"
        )))
    }

    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(s) => value == s,
            Pattern::Prefix(p) => value.starts_with(p.as_str()),
            Pattern::Suffix(s) => value.ends_with(s.as_str()),
        }
    }
}

impl FromStr for Pattern {
    type Err = CodegateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Pattern::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => f.write_str("*"),
            Pattern::Exact(s) => f.write_str(s),
            Pattern::Prefix(p) => write!(f, "{p}*"),
            Pattern::Suffix(s) => write!(f, "*{s}"),
        }
    }
}

/// Matches a [`Location`] by container and, optionally, by member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationMatcher {
    container: Pattern,
    member: Option<Pattern>,
}

impl LocationMatcher {
    pub fn new(container: Pattern) -> Self {
        Self {
            container,
            member: None,
        }
    }

    /// Matches every location.
    pub fn any() -> Self {
        Self::new(Pattern::Any)
    }

    #[must_use]
    pub fn with_member(mut self, member: Pattern) -> Self {
        self.member = Some(member);
        self
    }

    /// Parse `container[#member]`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once('#') {
            Some((container, member)) => {
                Ok(Self::new(container.parse()?).with_member(member.parse()?))
            }
            None => Ok(Self::new(s.parse()?)),
        }
    }

    pub fn container(&self) -> &Pattern {
        &self.container
    }

    pub fn member(&self) -> Option<&Pattern> {
        self.member.as_ref()
    }

    /// Match against a bare name, ignoring any member pattern. Used where
    /// only a group or unit name is available.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.container.matches(name)
    }

    #[must_use]
    pub fn matches(&self, location: &Location) -> bool {
        if !self.container.matches(&location.container) {
            return false;
        }
        match (&self.member, location.member.as_deref()) {
            (None, _) => true,
            (Some(pattern), Some(member)) => pattern.matches(member),
            (Some(pattern), None) => *pattern == Pattern::Any,
        }
    }
}

impl FromStr for LocationMatcher {
    type Err = CodegateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        LocationMatcher::parse(s)
    }
}

impl TryFrom<String> for LocationMatcher {
    type Error = CodegateError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        LocationMatcher::parse(&s)
    }
}

impl From<LocationMatcher> for String {
    fn from(m: LocationMatcher) -> Self {
        m.to_string()
    }
}

impl fmt::Display for LocationMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.container)?;
        if let Some(member) = &self.member {
            write!(f, "#{member}")?;
        }
        Ok(())
    }
}
