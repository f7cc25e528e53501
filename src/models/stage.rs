use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PromotionError;

/// Lifecycle stage of a registered model, stored in the registry as an alias.
///
/// # Lifecycle
/// Stages only move forward: None → Staging → Production → Archived.
/// `Archived` is terminal.
///
/// - `None`: A raw version that has never been promoted
/// - `Staging`: Under evaluation
/// - `Production`: Serving traffic
/// - `Archived`: Retired, no further transition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "lowercase")]
pub enum Stage {
    None,
    Staging,
    Production,
    Archived,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::None,
        Stage::Staging,
        Stage::Production,
        Stage::Archived,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Archived => "archived",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "staging" => Some(Self::Staging),
            "production" => Some(Self::Production),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Classify a selector as the stage it currently points at.
    ///
    /// A selector starting with a digit run is a raw version number and
    /// therefore has no stage yet. Anything else must be a stage label.
    pub fn classify(selector: &str) -> Result<Self, PromotionError> {
        if selector.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(Self::None);
        }
        Self::from_label(selector).ok_or_else(|| PromotionError::UnknownStage {
            label: selector.to_string(),
        })
    }

    /// The stage a model moves to when promoted from this one.
    pub fn next(&self) -> Result<Self, PromotionError> {
        match self {
            Self::None => Ok(Self::Staging),
            Self::Staging => Ok(Self::Production),
            Self::Production => Ok(Self::Archived),
            Self::Archived => Err(PromotionError::TerminalStage { stage: *self }),
        }
    }

    /// Inverse of [`Stage::next`]. `None` has no predecessor.
    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::None => None,
            Self::Staging => Some(Self::None),
            Self::Production => Some(Self::Staging),
            Self::Archived => Some(Self::Production),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = PromotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| PromotionError::UnknownStage {
            label: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_follows_transition_table() {
        assert_eq!(Stage::None.next().unwrap(), Stage::Staging);
        assert_eq!(Stage::Staging.next().unwrap(), Stage::Production);
        assert_eq!(Stage::Production.next().unwrap(), Stage::Archived);
    }

    #[test]
    fn archived_has_no_successor() {
        let err = Stage::Archived.next().unwrap_err();
        assert!(matches!(
            err,
            PromotionError::TerminalStage {
                stage: Stage::Archived
            }
        ));
    }

    #[test]
    fn next_of_previous_is_identity() {
        for stage in [Stage::Staging, Stage::Production, Stage::Archived] {
            let prev = stage.previous().expect("has predecessor");
            assert_eq!(prev.next().unwrap(), stage);
        }
        assert!(Stage::None.previous().is_none());
    }

    #[test]
    fn digit_selectors_classify_as_none() {
        for selector in ["0", "42", "007", "123456789"] {
            assert_eq!(Stage::classify(selector).unwrap(), Stage::None);
        }
    }

    #[test]
    fn leading_digit_run_is_enough() {
        assert_eq!(Stage::classify("42abc").unwrap(), Stage::None);
    }

    #[test]
    fn labels_classify_as_themselves() {
        for stage in Stage::ALL {
            assert_eq!(Stage::classify(stage.label()).unwrap(), stage);
        }
    }

    #[test]
    fn unknown_labels_are_rejected() {
        for selector in ["stg", "prd", "Staging", "latest", "", "a1"] {
            let err = Stage::classify(selector).unwrap_err();
            assert!(
                matches!(err, PromotionError::UnknownStage { ref label } if label == selector),
                "unexpected error for {selector:?}: {err}"
            );
        }
    }

    #[test]
    fn display_and_from_str_agree() {
        for stage in Stage::ALL {
            assert_eq!(stage.to_string().parse::<Stage>().unwrap(), stage);
        }
    }

    #[test]
    fn value_enum_accepts_labels_only() {
        assert_eq!(
            <Stage as ValueEnum>::from_str("production", false).unwrap(),
            Stage::Production
        );
        assert!(<Stage as ValueEnum>::from_str("prod", false).is_err());
    }
}
