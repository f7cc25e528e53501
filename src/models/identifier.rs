use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PromotionError;

const VERSION_SEPARATOR: char = '/';
const ALIAS_SEPARATOR: char = '@';

/// A model reference as typed on the command line: `foo/42` or `foo@staging`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIdentifier {
    /// Registered model name.
    pub name: String,
    /// Version number or alias, everything after the separator.
    pub selector: String,
    pub kind: SelectorKind,
}

/// Which separator introduced the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    /// `name/<version>`
    Version,
    /// `name@<alias>`
    Alias,
}

impl SelectorKind {
    pub fn separator(&self) -> char {
        match self {
            Self::Version => VERSION_SEPARATOR,
            Self::Alias => ALIAS_SEPARATOR,
        }
    }
}

impl ModelIdentifier {
    /// Parse `name/<version>` or `name@<alias>`.
    ///
    /// Exactly one kind of separator must appear, exactly once, with a
    /// non-empty name on its left and a non-empty selector on its right.
    pub fn parse(raw: &str) -> Result<Self, PromotionError> {
        let has_version = raw.contains(VERSION_SEPARATOR);
        let has_alias = raw.contains(ALIAS_SEPARATOR);

        let kind = match (has_version, has_alias) {
            (true, true) => {
                return Err(PromotionError::AmbiguousIdentifier {
                    identifier: raw.to_string(),
                })
            }
            (false, false) => {
                return Err(PromotionError::MissingSelector {
                    identifier: raw.to_string(),
                })
            }
            (true, false) => SelectorKind::Version,
            (false, true) => SelectorKind::Alias,
        };

        let parts: Vec<&str> = raw.split(kind.separator()).collect();
        match parts.as_slice() {
            [name, selector] if !name.is_empty() && !selector.is_empty() => Ok(Self {
                name: (*name).to_string(),
                selector: (*selector).to_string(),
                kind,
            }),
            _ => Err(PromotionError::MalformedIdentifier {
                identifier: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, self.kind.separator(), self.selector)
    }
}

impl FromStr for ModelIdentifier {
    type Err = PromotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
