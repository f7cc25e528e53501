use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use super::{ModelRegistry, RegistryError};
use crate::models::ModelVersion;

#[derive(Debug, Default)]
struct RegisteredModel {
    /// Keyed by version number; numbering starts at 1 like MLflow.
    versions: BTreeMap<u64, ModelVersion>,
    /// alias -> version number
    aliases: HashMap<String, u64>,
}

impl RegisteredModel {
    fn snapshot(&self, number: u64) -> Option<ModelVersion> {
        let mut version = self.versions.get(&number)?.clone();
        let mut aliases: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, target)| **target == number)
            .map(|(alias, _)| alias.clone())
            .collect();
        aliases.sort();
        version.aliases = aliases;
        Some(version)
    }
}

/// Process-local registry with the same lookup semantics as MLflow.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    models: Arc<Mutex<HashMap<String, RegisteredModel>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new version of `name`, creating the model if needed.
    pub fn register_version(&self, name: &str) -> ModelVersion {
        let mut models = self.models.lock().expect("registry lock poisoned");
        let model = models.entry(name.to_string()).or_default();
        let number = model.versions.keys().next_back().copied().unwrap_or(0) + 1;
        let mut version = ModelVersion::new(name, number.to_string());
        version.status = Some("READY".to_string());
        model.versions.insert(number, version.clone());
        version
    }

    /// The version number `alias` currently points at, if any.
    pub fn alias_target(&self, name: &str, alias: &str) -> Option<String> {
        let models = self.models.lock().expect("registry lock poisoned");
        models
            .get(name)?
            .aliases
            .get(alias)
            .map(|number| number.to_string())
    }

    /// All aliases of `name`, sorted by alias.
    pub fn aliases(&self, name: &str) -> BTreeMap<String, String> {
        let models = self.models.lock().expect("registry lock poisoned");
        models
            .get(name)
            .map(|model| {
                model
                    .aliases
                    .iter()
                    .map(|(alias, number)| (alias.clone(), number.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parse_number(name: &str, version: &str) -> Result<u64, RegistryError> {
        version.parse().map_err(|_| {
            RegistryError::BadRequest(format!(
                "version '{}' of model '{}' is not a valid version number",
                version, name
            ))
        })
    }

    fn missing_model(name: &str) -> RegistryError {
        RegistryError::NotFound(format!("registered model '{}' not found", name))
    }
}

impl ModelRegistry for InMemoryRegistry {
    async fn get_version_by_number(
        &self,
        name: &str,
        version: &str,
    ) -> Result<ModelVersion, RegistryError> {
        let number = Self::parse_number(name, version)?;
        let models = self.models.lock().expect("registry lock poisoned");
        let model = models.get(name).ok_or_else(|| Self::missing_model(name))?;
        model.snapshot(number).ok_or_else(|| {
            RegistryError::NotFound(format!("model version ({}, {}) not found", name, version))
        })
    }

    async fn get_version_by_alias(
        &self,
        name: &str,
        alias: &str,
    ) -> Result<ModelVersion, RegistryError> {
        let models = self.models.lock().expect("registry lock poisoned");
        let model = models.get(name).ok_or_else(|| Self::missing_model(name))?;
        let number = model.aliases.get(alias).ok_or_else(|| {
            RegistryError::NotFound(format!(
                "registered model alias '{}' not found for model '{}'",
                alias, name
            ))
        })?;
        model
            .snapshot(*number)
            .ok_or_else(|| RegistryError::Server(format!("alias '{}' is dangling", alias)))
    }

    async fn set_alias(
        &self,
        name: &str,
        alias: &str,
        version: &str,
    ) -> Result<(), RegistryError> {
        let number = Self::parse_number(name, version)?;
        let mut models = self.models.lock().expect("registry lock poisoned");
        let model = models
            .get_mut(name)
            .ok_or_else(|| Self::missing_model(name))?;
        if !model.versions.contains_key(&number) {
            return Err(RegistryError::NotFound(format!(
                "model version ({}, {}) not found",
                name, version
            )));
        }
        model.aliases.insert(alias.to_string(), number);
        Ok(())
    }
}
