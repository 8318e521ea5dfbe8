//! Build lifecycle execution for protium.
//!
//! A build walks a fixed sequence of phases. Each phase runs its
//! configured parts in order; recipe-kind parts dispatch to plugin
//! implementations resolved by identifier through [`RecipeRegistry`],
//! behind the compatibility façade of [`LegacyPluginAdapter`].

mod adapter;
mod errors;
mod recipes;
mod runner;

pub use adapter::{BuildMeta, LegacyPluginAdapter, BUILD_KEY};
pub use errors::{BuildError, RecipeError, Result};
pub use recipes::{CommandRecipe, PartOptions, Recipe, RecipeFactory, RecipeRegistry};
pub use runner::{BuildRunner, BuildState, PartOutcome, PartStatus};
