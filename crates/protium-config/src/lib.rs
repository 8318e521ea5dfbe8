//! Project configuration for protium builds.
//!
//! A build is described by a single YAML project file (`protium.yaml`):
//! lifecycle phases mapping to ordered part lists, part definitions,
//! package bundles, index URLs, and the managed environment directory.
//! The file is parsed and validated here; everything downstream consumes
//! the result read-only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default project file name, looked up in the build root.
pub const PROJECT_FILE: &str = "protium.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse project file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A point in the fixed build lifecycle at which configured parts run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreInstall,
    PostInstall,
}

impl Phase {
    /// The full lifecycle, in execution order.
    pub const LIFECYCLE: [Phase; 2] = [Phase::PreInstall, Phase::PostInstall];

    /// The key this phase is listed under in the project file.
    pub fn key(self) -> &'static str {
        match self {
            Phase::PreInstall => "pre-install",
            Phase::PostInstall => "post-install",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What a part dispatches to. Derived from the keys a part declares
/// rather than spelled out in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// Dispatches to a registered recipe plugin.
    Recipe,
    /// Declared but not executable yet.
    Isotope,
}

impl PartKind {
    pub fn name(self) -> &'static str {
        match self {
            PartKind::Recipe => "recipe",
            PartKind::Isotope => "isotope",
        }
    }
}

/// A named unit of build work, as declared in the project file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartConfig {
    /// Identifier of the recipe plugin this part dispatches to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,

    /// Isotope identifier. Parsed so existing project files load, but
    /// isotope parts are not executable yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isotope: Option<String>,

    /// Everything else in the part table is handed to the recipe as-is.
    #[serde(flatten)]
    pub options: BTreeMap<String, serde_yaml::Value>,
}

impl PartConfig {
    /// The kind this part dispatches by, or `None` if it declares neither.
    pub fn kind(&self) -> Option<PartKind> {
        if self.recipe.is_some() {
            Some(PartKind::Recipe)
        } else if self.isotope.is_some() {
            Some(PartKind::Isotope)
        } else {
            None
        }
    }
}

/// Parsed project file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Phase key to ordered part-name list.
    #[serde(default)]
    pub phases: BTreeMap<String, Vec<String>>,

    /// Part name to part definition.
    #[serde(default)]
    pub parts: BTreeMap<String, PartConfig>,

    /// Packages installed in editable mode during the install phase.
    #[serde(default, rename = "develop-packages")]
    pub develop_packages: Vec<String>,

    /// Packages installed normally during the install phase.
    #[serde(default)]
    pub packages: Vec<String>,

    /// Ordered package index URLs. Kept as a raw YAML value so a
    /// wrong-typed entry is reported as a configuration error instead
    /// of a parse failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexes: Option<serde_yaml::Value>,

    /// Managed environment directory packages are installed into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load a project file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse project-file YAML.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Ordered part names for a phase key; empty when the phase is not
    /// configured.
    pub fn phase_parts(&self, key: &str) -> &[String] {
        self.phases.get(key).map_or(&[], Vec::as_slice)
    }

    /// Look up a part definition by name.
    pub fn part(&self, name: &str) -> Option<&PartConfig> {
        self.parts.get(name)
    }

    /// Ordered index URLs, validated to be a sequence of strings.
    pub fn index_urls(&self) -> Result<Vec<String>> {
        let Some(value) = &self.indexes else {
            return Ok(Vec::new());
        };
        let serde_yaml::Value::Sequence(entries) = value else {
            return Err(ConfigError::Invalid(
                "only a sequence can be set as a value for indexes".to_string(),
            ));
        };
        entries
            .iter()
            .map(|entry| match entry {
                serde_yaml::Value::String(url) => Ok(url.clone()),
                other => Err(ConfigError::Invalid(format!(
                    "index entry is not a string: {other:?}"
                ))),
            })
            .collect()
    }

    /// Validate the configuration, collecting every problem instead of
    /// stopping at the first.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let lifecycle: Vec<&str> = Phase::LIFECYCLE.iter().map(|p| p.key()).collect();
        for key in self.phases.keys() {
            if !lifecycle.contains(&key.as_str()) {
                errors.push(format!(
                    "unknown phase '{key}' (expected one of: {})",
                    lifecycle.join(", ")
                ));
            }
        }

        for (phase, part_names) in &self.phases {
            for name in part_names {
                if !self.parts.contains_key(name) {
                    errors.push(format!("phase '{phase}' references unknown part '{name}'"));
                }
            }
        }

        for (name, part) in &self.parts {
            if name.is_empty() {
                errors.push("part with empty name".to_string());
            }
            match part.kind() {
                Some(PartKind::Recipe) => {
                    if part.recipe.as_deref().is_some_and(str::is_empty) {
                        errors.push(format!("part '{name}' has an empty recipe identifier"));
                    }
                }
                Some(PartKind::Isotope) => {}
                None => {
                    errors.push(format!(
                        "part '{name}' declares neither a recipe nor an isotope"
                    ));
                }
            }
        }

        if let Err(err) = self.index_urls() {
            errors.push(err.to_string());
        }

        errors
    }
}
