use thiserror::Error;

use crate::models::Stage;
use crate::registry::RegistryError;

/// Everything that can stop a promotion. None of these are retried.
#[derive(Debug, Error)]
pub enum PromotionError {
    #[error("identifier '{identifier}' contains both '/' and '@'")]
    AmbiguousIdentifier { identifier: String },

    #[error(
        "identifier '{identifier}' must contain either a version (foo/42) or an alias (foo@staging)"
    )]
    MissingSelector { identifier: String },

    #[error(
        "identifier '{identifier}' must be exactly <name>/<version> or <name>@<alias> with non-empty parts"
    )]
    MalformedIdentifier { identifier: String },

    #[error("unknown stage '{label}', expected a version number or one of: none, staging, production, archived")]
    UnknownStage { label: String },

    #[error("stage '{stage}' is terminal and cannot be transitioned")]
    TerminalStage { stage: Stage },

    #[error(
        "requested stage '{requested}' does not match the stage implied by the identifier '{implied}'"
    )]
    StageMismatch { requested: Stage, implied: Stage },

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
