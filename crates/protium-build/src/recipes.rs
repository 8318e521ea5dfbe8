//! Recipe plugins and their identifier-keyed registry.
//!
//! Recipe identifiers come from open-ended project configuration, so
//! resolution goes through a string-keyed factory registry rather than
//! a closed set of variants.

use crate::adapter::LegacyPluginAdapter;
use crate::errors::RecipeError;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Options a part hands to its recipe, as declared in the project file.
pub type PartOptions = BTreeMap<String, serde_yaml::Value>;

/// A unit of build work dispatched from a part.
///
/// Instances live for exactly one part execution and own no cross-part
/// state.
pub trait Recipe {
    fn install(&mut self) -> Result<(), RecipeError>;
}

/// Constructs a recipe instance from (adapter, part name, part options).
pub type RecipeFactory =
    Box<dyn Fn(&LegacyPluginAdapter, &str, &PartOptions) -> Box<dyn Recipe>>;

/// Identifier-keyed recipe factories.
#[derive(Default)]
pub struct RecipeRegistry {
    factories: HashMap<String, RecipeFactory>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in recipes registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("command", |adapter, part, options| {
            Box::new(CommandRecipe::new(adapter, part, options))
        });
        registry
    }

    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F)
    where
        F: Fn(&LegacyPluginAdapter, &str, &PartOptions) -> Box<dyn Recipe> + 'static,
    {
        self.factories.insert(identifier.into(), Box::new(factory));
    }

    pub fn resolve(&self, identifier: &str) -> Option<&RecipeFactory> {
        self.factories.get(identifier)
    }

    pub fn identifiers(&self) -> Vec<&str> {
        let mut identifiers: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        identifiers.sort_unstable();
        identifiers
    }
}

/// Built-in recipe that runs a configured command in the build root.
///
/// Part options: `command` is the argv as a sequence of strings.
pub struct CommandRecipe {
    part: String,
    directory: Option<PathBuf>,
    options: PartOptions,
}

impl CommandRecipe {
    pub fn new(adapter: &LegacyPluginAdapter, part: &str, options: &PartOptions) -> Self {
        Self {
            part: part.to_string(),
            directory: adapter.lookup(crate::BUILD_KEY).map(|meta| meta.directory),
            options: options.clone(),
        }
    }

    fn argv(&self) -> Result<Vec<String>, RecipeError> {
        let value = self.options.get("command").ok_or_else(|| {
            RecipeError::UserInput(format!("part '{}' has no 'command' option", self.part))
        })?;
        let serde_yaml::Value::Sequence(entries) = value else {
            return Err(RecipeError::UserInput(format!(
                "part '{}': 'command' must be a sequence of strings",
                self.part
            )));
        };
        let argv: Vec<String> = entries
            .iter()
            .filter_map(|entry| entry.as_str().map(str::to_string))
            .collect();
        if argv.len() != entries.len() || argv.is_empty() {
            return Err(RecipeError::UserInput(format!(
                "part '{}': 'command' must be a non-empty sequence of strings",
                self.part
            )));
        }
        Ok(argv)
    }
}

impl Recipe for CommandRecipe {
    fn install(&mut self) -> Result<(), RecipeError> {
        let argv = self.argv()?;
        debug!("part '{}': running {:?}", self.part, argv);

        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        if let Some(directory) = &self.directory {
            command.current_dir(directory);
        }

        let output = command.output().map_err(|e| {
            RecipeError::UserInput(format!(
                "part '{}': could not run '{}': {e}",
                self.part, argv[0]
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecipeError::UserInput(format!(
                "part '{}': '{}' exited with code {}:\n{}",
                self.part,
                argv[0],
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        info!("part '{}' installed", self.part);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> LegacyPluginAdapter {
        LegacyPluginAdapter::new("/tmp")
    }

    fn options_with_command(command: serde_yaml::Value) -> PartOptions {
        let mut options = PartOptions::new();
        options.insert("command".to_string(), command);
        options
    }

    #[test]
    fn test_registry_resolution() {
        let registry = RecipeRegistry::with_builtins();
        assert!(registry.resolve("command").is_some());
        assert!(registry.resolve("does-not-exist").is_none());
        assert_eq!(registry.identifiers(), ["command"]);
    }

    #[test]
    fn test_register_custom_factory() {
        struct Noop;
        impl Recipe for Noop {
            fn install(&mut self) -> Result<(), RecipeError> {
                Ok(())
            }
        }

        let mut registry = RecipeRegistry::new();
        registry.register("noop", |_, _, _| Box::new(Noop));

        let factory = registry.resolve("noop").unwrap();
        let mut recipe = factory(&adapter(), "a-part", &PartOptions::new());
        recipe.install().unwrap();
    }

    #[test]
    fn test_command_recipe_missing_command_is_user_error() {
        let mut recipe = CommandRecipe::new(&adapter(), "broken", &PartOptions::new());
        let err = recipe.install().unwrap_err();
        assert!(matches!(err, RecipeError::UserInput(_)));
    }

    #[test]
    fn test_command_recipe_rejects_non_sequence() {
        let options = options_with_command(serde_yaml::Value::String("echo hi".to_string()));
        let mut recipe = CommandRecipe::new(&adapter(), "broken", &options);
        assert!(matches!(
            recipe.install().unwrap_err(),
            RecipeError::UserInput(_)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_recipe_runs_in_build_root() {
        use tempfile::TempDir;

        let root = TempDir::new().unwrap();
        let adapter = LegacyPluginAdapter::new(root.path());
        let options = options_with_command(serde_yaml::from_str("[\"touch\", \"marker\"]").unwrap());

        let mut recipe = CommandRecipe::new(&adapter, "touch-marker", &options);
        recipe.install().unwrap();

        assert!(root.path().join("marker").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_recipe_nonzero_exit_is_user_error() {
        let options = options_with_command(
            serde_yaml::from_str("[\"sh\", \"-c\", \"echo bad input >&2; exit 2\"]").unwrap(),
        );
        let mut recipe = CommandRecipe::new(&adapter(), "failing", &options);

        let err = recipe.install().unwrap_err();
        match err {
            RecipeError::UserInput(message) => {
                assert!(message.contains("exit"));
                assert!(message.contains("bad input"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
