//! Compatibility façade handed to recipe plugins.
//!
//! Third-party recipes were written against a legacy build object that
//! looked like a mapping. This adapter reproduces exactly the slice of
//! that shape they rely on: a reserved-key lookup exposing the build
//! root, and write operations that go nowhere. It is deliberately not a
//! data store; do not add real mutation semantics.

use crate::errors::{BuildError, RecipeError, Result};
use crate::recipes::{Recipe, RecipeRegistry};
use crate::runner::PartStatus;
use protium_config::PartConfig;
use std::path::PathBuf;
use tracing::error;

/// The one key [`LegacyPluginAdapter::lookup`] answers.
pub const BUILD_KEY: &str = "build";

/// Build-root metadata exposed to recipes through the reserved key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMeta {
    pub directory: PathBuf,
}

pub struct LegacyPluginAdapter {
    root: PathBuf,
    registry: RecipeRegistry,
}

impl LegacyPluginAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_registry(root, RecipeRegistry::with_builtins())
    }

    pub fn with_registry(root: impl Into<PathBuf>, registry: RecipeRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    /// Restricted lookup: the reserved key resolves to the build-root
    /// metadata, every other key to nothing.
    pub fn lookup(&self, key: &str) -> Option<BuildMeta> {
        (key == BUILD_KEY).then(|| BuildMeta {
            directory: self.root.clone(),
        })
    }

    /// Intentional no-op; stores nothing. Kept so recipes written
    /// against the legacy mapping shape keep working.
    pub fn set(&self, _key: &str, _value: serde_yaml::Value) {}

    /// Intentional no-op; see [`LegacyPluginAdapter::set`].
    pub fn delete(&self, _key: &str) {}

    /// Instantiate the recipe a part declares, resolved by identifier
    /// through the registry and constructed with
    /// (adapter, part name, part options).
    pub fn part_instance(&self, name: &str, part: &PartConfig) -> Result<Box<dyn Recipe>> {
        let identifier = part
            .recipe
            .as_deref()
            .ok_or_else(|| BuildError::MissingRecipe(name.to_string()))?;
        let factory = self
            .registry
            .resolve(identifier)
            .ok_or_else(|| BuildError::UnknownRecipe(identifier.to_string()))?;
        Ok(factory(self, name, &part.options))
    }

    /// Run a recipe's install operation. A user-input error is logged
    /// and reported as a [`PartStatus::UserError`] so the phase keeps
    /// going; anything else propagates unmodified.
    pub fn install_part(&self, name: &str, recipe: &mut dyn Recipe) -> Result<PartStatus> {
        match recipe.install() {
            Ok(()) => Ok(PartStatus::Installed),
            Err(RecipeError::UserInput(message)) => {
                error!("{message}");
                Ok(PartStatus::UserError(message))
            }
            Err(other) => Err(BuildError::Recipe {
                part: name.to_string(),
                source: other,
            }),
        }
    }

    pub fn registry(&self) -> &RecipeRegistry {
        &self.registry
    }
}
