//! The phase-ordered build lifecycle.

use crate::adapter::LegacyPluginAdapter;
use crate::errors::{BuildError, Result};
use crate::recipes::RecipeRegistry;
use protium_config::{PartKind, Phase, ProjectConfig};
use protium_pkg::PackageInstaller;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Where a run currently stands. Transitions are strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    NotStarted,
    PreInstall,
    Installing,
    PostInstall,
    Done,
}

/// What happened to one part during a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartOutcome {
    pub part: String,
    pub status: PartStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartStatus {
    /// The part's recipe ran to completion.
    Installed,
    /// The recipe rejected its input; logged, and the phase moved on.
    UserError(String),
    /// The declared kind has no implementation. Surfaced rather than
    /// silently skipped so callers can see the gap.
    Unimplemented(&'static str),
}

/// Runs the build lifecycle: pre-install parts, package bundles,
/// post-install parts, in that order, one at a time.
pub struct BuildRunner<'a> {
    config: &'a ProjectConfig,
    installer: &'a mut PackageInstaller,
    adapter: LegacyPluginAdapter,
    state: BuildState,
}

impl<'a> BuildRunner<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &'a ProjectConfig,
        installer: &'a mut PackageInstaller,
        registry: RecipeRegistry,
    ) -> Self {
        Self {
            config,
            installer,
            adapter: LegacyPluginAdapter::with_registry(root, registry),
            state: BuildState::NotStarted,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Execute the full lifecycle and report every part outcome.
    pub fn run(&mut self) -> Result<Vec<PartOutcome>> {
        self.state = BuildState::PreInstall;
        let mut outcomes = self.run_phase(Phase::PreInstall)?;

        self.state = BuildState::Installing;
        self.install_bundles()?;

        self.state = BuildState::PostInstall;
        outcomes.extend(self.run_phase(Phase::PostInstall)?);

        self.state = BuildState::Done;
        Ok(outcomes)
    }

    /// Run one phase's parts in their configured order. A user-input
    /// error in one part does not stop the ones after it.
    pub fn run_phase(&mut self, phase: Phase) -> Result<Vec<PartOutcome>> {
        let part_names = self.config.phase_parts(phase.key());
        debug!("phase {phase}: {} part(s)", part_names.len());

        let mut outcomes = Vec::with_capacity(part_names.len());
        for name in part_names {
            let part = self
                .config
                .part(name)
                .ok_or_else(|| BuildError::UnknownPart(name.clone()))?;

            let status = match part.kind() {
                Some(PartKind::Recipe) => {
                    let mut instance = self.adapter.part_instance(name, part)?;
                    self.adapter.install_part(name, instance.as_mut())?
                }
                Some(kind @ PartKind::Isotope) => {
                    warn!("part '{name}': kind '{}' is not implemented", kind.name());
                    PartStatus::Unimplemented(kind.name())
                }
                None => return Err(BuildError::UndeclaredKind(name.clone())),
            };

            outcomes.push(PartOutcome {
                part: name.clone(),
                status,
            });
        }
        Ok(outcomes)
    }

    /// Install the configured bundles: develop packages in editable
    /// mode first, then the regular packages, each as one bulk install.
    fn install_bundles(&mut self) -> Result<()> {
        if !self.config.develop_packages.is_empty() {
            let requirements: Vec<String> = self
                .config
                .develop_packages
                .iter()
                .map(|package| format!("-e {package}"))
                .collect();
            info!("installing {} develop package(s)", requirements.len());
            self.installer.install_list(&requirements, false, &[])?;
        }

        if !self.config.packages.is_empty() {
            info!("installing {} package(s)", self.config.packages.len());
            let requirements = self.config.packages.clone();
            self.installer.install_list(&requirements, false, &[])?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RecipeError;
    use crate::recipes::Recipe;
    use protium_pkg::{InstallArgs, InstalledPackage, PackageManager};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    /// Records install invocations; reports nothing installed.
    #[derive(Default)]
    struct FakeManager {
        installs: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl PackageManager for FakeManager {
        fn install(&self, args: InstallArgs<'_>) -> protium_pkg::Result<()> {
            self.installs
                .lock()
                .unwrap()
                .push(args.requirements.to_vec());
            Ok(())
        }

        fn installed_packages(
            &self,
        ) -> protium_pkg::Result<BTreeMap<String, InstalledPackage>> {
            Ok(BTreeMap::new())
        }

        fn uninstall(&self, _name: &str) -> protium_pkg::Result<()> {
            Ok(())
        }
    }

    struct ScriptedRecipe {
        part: String,
        error: Option<RecipeError>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recipe for ScriptedRecipe {
        fn install(&mut self) -> std::result::Result<(), RecipeError> {
            self.log.lock().unwrap().push(self.part.clone());
            match self.error.take() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }
    }

    fn scripted_registry(
        log: &Arc<Mutex<Vec<String>>>,
        failing: &[(&str, fn(String) -> RecipeError)],
    ) -> RecipeRegistry {
        let mut registry = RecipeRegistry::new();
        let log = Arc::clone(log);
        let failing: Vec<(String, fn(String) -> RecipeError)> = failing
            .iter()
            .map(|(part, make)| ((*part).to_string(), *make))
            .collect();
        registry.register("scripted", move |_, part, _| {
            let error = failing
                .iter()
                .find(|(name, _)| name == part)
                .map(|(_, make)| make(format!("part '{part}' rejected its input")));
            Box::new(ScriptedRecipe {
                part: part.to_string(),
                error,
                log: Arc::clone(&log),
            })
        });
        registry
    }

    fn installer() -> (PackageInstaller, Arc<Mutex<Vec<Vec<String>>>>) {
        let fake = FakeManager::default();
        let installs = Arc::clone(&fake.installs);
        (PackageInstaller::new(Box::new(fake)), installs)
    }

    const TWO_PART_CONFIG: &str = r#"
phases:
  pre-install: [a, b]
parts:
  a:
    recipe: scripted
  b:
    recipe: scripted
"#;

    #[test]
    fn test_user_error_does_not_abort_phase() {
        let config = ProjectConfig::parse(TWO_PART_CONFIG).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = scripted_registry(&log, &[("a", RecipeError::UserInput)]);
        let (mut installer, _) = installer();
        let mut runner = BuildRunner::new("/build", &config, &mut installer, registry);

        let outcomes = runner.run_phase(Phase::PreInstall).unwrap();

        assert_eq!(*log.lock().unwrap(), ["a", "b"]);
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0].status, PartStatus::UserError(_)));
        assert_eq!(outcomes[1].status, PartStatus::Installed);
    }

    #[test]
    fn test_fatal_recipe_error_aborts_phase() {
        let config = ProjectConfig::parse(TWO_PART_CONFIG).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = scripted_registry(&log, &[("a", RecipeError::Failed)]);
        let (mut installer, _) = installer();
        let mut runner = BuildRunner::new("/build", &config, &mut installer, registry);

        let err = runner.run_phase(Phase::PreInstall).unwrap_err();

        assert!(matches!(err, BuildError::Recipe { .. }));
        // "b" never ran.
        assert_eq!(*log.lock().unwrap(), ["a"]);
    }

    #[test]
    fn test_parts_run_in_configured_order() {
        let config = ProjectConfig::parse(
            r#"
phases:
  pre-install: [later, earlier, middle]
parts:
  earlier: { recipe: scripted }
  middle: { recipe: scripted }
  later: { recipe: scripted }
"#,
        )
        .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = scripted_registry(&log, &[]);
        let (mut installer, _) = installer();
        let mut runner = BuildRunner::new("/build", &config, &mut installer, registry);

        runner.run_phase(Phase::PreInstall).unwrap();

        assert_eq!(*log.lock().unwrap(), ["later", "earlier", "middle"]);
    }

    #[test]
    fn test_isotope_part_is_surfaced_as_unimplemented() {
        let config = ProjectConfig::parse(
            r#"
phases:
  pre-install: [both, stable]
parts:
  both: { recipe: scripted }
  stable: { isotope: finalize }
"#,
        )
        .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = scripted_registry(&log, &[]);
        let (mut installer, _) = installer();
        let mut runner = BuildRunner::new("/build", &config, &mut installer, registry);

        let outcomes = runner.run_phase(Phase::PreInstall).unwrap();

        assert_eq!(outcomes[1].part, "stable");
        assert_eq!(outcomes[1].status, PartStatus::Unimplemented("isotope"));
    }

    #[test]
    fn test_unknown_part_reference_fails() {
        let config = ProjectConfig::parse("phases:\n  pre-install: [ghost]\n").unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut installer, _) = installer();
        let mut runner = BuildRunner::new(
            "/build",
            &config,
            &mut installer,
            scripted_registry(&log, &[]),
        );

        let err = runner.run_phase(Phase::PreInstall).unwrap_err();
        assert!(matches!(err, BuildError::UnknownPart(_)));
    }

    #[test]
    fn test_run_installs_bundles_and_reaches_done() {
        let config = ProjectConfig::parse(
            r#"
develop-packages: [".", "../shared-lib"]
packages: [requests, attrs]
"#,
        )
        .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut installer, installs) = installer();
        let mut runner = BuildRunner::new(
            "/build",
            &config,
            &mut installer,
            scripted_registry(&log, &[]),
        );
        assert_eq!(runner.state(), BuildState::NotStarted);

        let outcomes = runner.run().unwrap();

        assert!(outcomes.is_empty());
        assert_eq!(runner.state(), BuildState::Done);
        assert_eq!(
            *installs.lock().unwrap(),
            [
                vec!["-e .".to_string(), "-e ../shared-lib".to_string()],
                vec!["requests".to_string(), "attrs".to_string()],
            ]
        );
    }

    #[test]
    fn test_run_covers_both_phases() {
        let config = ProjectConfig::parse(
            r#"
phases:
  pre-install: [first]
  post-install: [second]
parts:
  first: { recipe: scripted }
  second: { recipe: scripted }
"#,
        )
        .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut installer, _) = installer();
        let mut runner = BuildRunner::new(
            "/build",
            &config,
            &mut installer,
            scripted_registry(&log, &[]),
        );

        let outcomes = runner.run().unwrap();

        assert_eq!(*log.lock().unwrap(), ["first", "second"]);
        assert_eq!(outcomes.len(), 2);
    }
}
