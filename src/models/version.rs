use serde::{Deserialize, Serialize};

/// A concrete, immutable model version as reported by the registry.
///
/// Only `name` and `version` are needed to repoint an alias; the remaining
/// fields are carried for logging and are optional because not every
/// registry fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name: String,
    /// Registry version number, kept as the string the registry returns.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ModelVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            current_stage: None,
            status: None,
            run_id: None,
            aliases: Vec::new(),
        }
    }
}

/// Outcome of a successful promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub name: String,
    pub version: String,
    pub from: super::Stage,
    pub to: super::Stage,
}

impl Promotion {
    /// The `key=value` pair reported to CI: `version=<name>/<version>`.
    pub fn output_pair(&self) -> (&'static str, String) {
        ("version", format!("{}/{}", self.name, self.version))
    }
}
