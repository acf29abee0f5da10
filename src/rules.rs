//! Suppression rules: "in these locations, ignore these codes".
//!
//! Rules are usually built with the [`In`] helper:
//!
//! ```
//! use codegate::rules::In;
//!
//! let rule = In::containers(["*Comparator", "com.acme.Legacy*"])
//!     .unwrap()
//!     .ignore(["SE_COMPARATOR_SHOULD_BE_SERIALIZABLE"]);
//! let everything = In::everywhere().ignore_all();
//! # let _ = (rule, everything);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::finding::Finding;
use crate::location::LocationMatcher;

/// The issue codes a rule suppresses. `Only` is never empty when built
/// through [`Codes::only`], the wire form or [`In::ignore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CodesRepr", into = "CodesRepr")]
pub enum Codes {
    All,
    Only(BTreeSet<String>),
}

impl Codes {
    /// An explicit code list. An empty list, or one containing `*`, means
    /// all codes.
    pub fn only<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = codes.into_iter().map(Into::into).collect();
        if set.is_empty() || set.contains("*") {
            Codes::All
        } else {
            Codes::Only(set)
        }
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        match self {
            Codes::All => true,
            Codes::Only(codes) => codes.contains(code),
        }
    }
}

/// Wire form: `"*"` or a list of codes. An empty list means all codes.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CodesRepr {
    Wildcard(String),
    List(Vec<String>),
}

impl From<CodesRepr> for Codes {
    fn from(repr: CodesRepr) -> Self {
        match repr {
            CodesRepr::Wildcard(s) if s == "*" => Codes::All,
            CodesRepr::Wildcard(s) => Codes::Only(BTreeSet::from([s])),
            CodesRepr::List(list) => Codes::only(list),
        }
    }
}

impl From<Codes> for CodesRepr {
    fn from(codes: Codes) -> Self {
        match codes {
            Codes::All => CodesRepr::Wildcard("*".to_string()),
            Codes::Only(set) => CodesRepr::List(set.into_iter().collect()),
        }
    }
}

impl fmt::Display for Codes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codes::All => f.write_str("*"),
            Codes::Only(codes) => {
                let joined: Vec<&str> = codes.iter().map(String::as_str).collect();
                f.write_str(&joined.join(", "))
            }
        }
    }
}

/// Suppresses `codes` at every location matched by any of `matchers`.
/// An empty matcher list matches everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    #[serde(rename = "in", default)]
    pub matchers: Vec<LocationMatcher>,
    pub codes: Codes,
}

impl IgnoreRule {
    /// True when this rule suppresses `finding`.
    #[must_use]
    pub fn matches(&self, finding: &Finding) -> bool {
        self.codes.contains(&finding.code)
            && (self.matchers.is_empty()
                || self.matchers.iter().any(|m| m.matches(&finding.location)))
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matchers.is_empty() {
            f.write_str("everywhere")?;
        } else {
            let names: Vec<String> = self.matchers.iter().map(ToString::to_string).collect();
            f.write_str(&names.join(" | "))?;
        }
        write!(f, " ignore [{}]", self.codes)
    }
}

/// Location half of an [`IgnoreRule`], completed by [`In::ignore`] or
/// [`In::ignore_all`].
#[derive(Debug, Clone, Default)]
pub struct In {
    matchers: Vec<LocationMatcher>,
}

impl In {
    pub fn everywhere() -> Self {
        Self::default()
    }

    /// Any of the given `container[#member]` patterns.
    pub fn containers<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let matchers = patterns
            .into_iter()
            .map(|p| LocationMatcher::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { matchers })
    }

    pub fn matcher(matcher: LocationMatcher) -> Self {
        Self {
            matchers: vec![matcher],
        }
    }

    #[must_use]
    pub fn and(mut self, other: In) -> Self {
        self.matchers.extend(other.matchers);
        self
    }

    pub fn ignore<I, S>(self, codes: I) -> IgnoreRule
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IgnoreRule {
            matchers: self.matchers,
            codes: Codes::only(codes),
        }
    }

    pub fn ignore_all(self) -> IgnoreRule {
        IgnoreRule {
            matchers: self.matchers,
            codes: Codes::All,
        }
    }
}
