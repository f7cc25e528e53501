//! Model registry access.
//!
//! Promotion only needs three registry capabilities, captured by
//! [`ModelRegistry`]:
//! - resolve a version by number
//! - resolve the version an alias points at
//! - point an alias at a version
//!
//! [`MlflowClient`] talks to an MLflow tracking server over HTTP.
//! [`InMemoryRegistry`] keeps everything in process and backs the tests.

mod client;
mod memory;

pub use client::MlflowClient;
pub use memory::InMemoryRegistry;

use thiserror::Error;

use crate::models::ModelVersion;

/// Registry errors, surfaced to the caller unmodified.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: credentials missing or rejected")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

/// The registry operations a promotion depends on.
///
/// Calls are awaited one after another; implementations need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait ModelRegistry {
    /// Look up `version` of the registered model `name`.
    async fn get_version_by_number(
        &self,
        name: &str,
        version: &str,
    ) -> Result<ModelVersion, RegistryError>;

    /// Look up the version `alias` currently points at.
    async fn get_version_by_alias(
        &self,
        name: &str,
        alias: &str,
    ) -> Result<ModelVersion, RegistryError>;

    /// Point `alias` at `version`, replacing any previous target.
    async fn set_alias(&self, name: &str, alias: &str, version: &str)
        -> Result<(), RegistryError>;
}
