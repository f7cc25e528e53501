//! Stage promotion.
//!
//! A promotion moves a model exactly one stage forward. The operator names
//! the model and the stage they expect to reach; the expected stage is only
//! a confirmation and must equal the stage derived from the identifier.

use crate::error::PromotionError;
use crate::models::{ModelIdentifier, ModelVersion, Promotion, Stage};
use crate::output::OutputSink;
use crate::registry::ModelRegistry;

/// The validated, registry-independent part of a promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionPlan {
    pub identifier: ModelIdentifier,
    pub current: Stage,
    pub next: Stage,
}

/// Parse, classify and check `raw` against the requested stage.
pub fn plan(raw: &str, requested: Stage) -> Result<PromotionPlan, PromotionError> {
    let identifier = ModelIdentifier::parse(raw)?;
    let current = Stage::classify(&identifier.selector)?;
    let next = current.next()?;

    if next != requested {
        return Err(PromotionError::StageMismatch {
            requested,
            implied: next,
        });
    }

    Ok(PromotionPlan {
        identifier,
        current,
        next,
    })
}

/// Carries out promotions against a registry.
pub struct Promoter<R> {
    registry: R,
}

impl<R: ModelRegistry> Promoter<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Promote `raw` to `requested` and report the version to `sink`.
    ///
    /// Nothing is written to the registry or the sink unless every check
    /// and lookup before the alias assignment succeeds.
    pub async fn promote<S: OutputSink>(
        &self,
        raw: &str,
        requested: Stage,
        sink: &mut S,
    ) -> Result<Promotion, PromotionError> {
        let plan = plan(raw, requested)?;
        let name = plan.identifier.name.as_str();
        tracing::info!(
            model = name,
            selector = %plan.identifier.selector,
            from = %plan.current,
            to = %plan.next,
            "Promoting model"
        );

        let resolved = self.resolve(&plan).await?;
        tracing::info!(model = name, version = %resolved.version, "Resolved model version");

        self.registry
            .set_alias(name, plan.next.label(), &resolved.version)
            .await?;
        tracing::info!(
            model = name,
            version = %resolved.version,
            alias = plan.next.label(),
            "Alias assigned"
        );

        let promotion = Promotion {
            name: name.to_string(),
            version: resolved.version,
            from: plan.current,
            to: plan.next,
        };
        let (key, value) = promotion.output_pair();
        sink.emit(key, &value)?;

        Ok(promotion)
    }

    /// Unpromoted versions are looked up by number, staged ones by the alias
    /// of their current stage.
    async fn resolve(&self, plan: &PromotionPlan) -> Result<ModelVersion, PromotionError> {
        let name = &plan.identifier.name;
        let version = match plan.current {
            Stage::None => {
                self.registry
                    .get_version_by_number(name, &plan.identifier.selector)
                    .await?
            }
            stage => {
                self.registry
                    .get_version_by_alias(name, stage.label())
                    .await?
            }
        };
        Ok(version)
    }
}
