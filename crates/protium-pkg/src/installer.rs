//! Public installation API over the package-manager client.

use crate::constraints::ConstraintStore;
use crate::env;
use crate::errors::{PkgError, Result};
use crate::pip::{InstallArgs, PackageManager};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Index queried when the project file configures none.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple/";

/// One requested installation. Constructed per call, discarded after
/// dispatch.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    pub name: String,
    /// Full version specifier, e.g. `==1.2.0`.
    pub version: Option<String>,
    /// Install in editable mode. Mutually exclusive with `version`.
    pub develop: bool,
    pub upgrade: bool,
    pub install_options: Vec<String>,
}

impl InstallRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Installs packages into the managed environment, tracking version
/// constraints across installs.
///
/// Constraint handling: every successful install re-reads the full
/// installed set from the package manager and pins each reported package
/// exactly, so the store always reflects the environment as a whole
/// rather than only what was requested.
pub struct PackageInstaller {
    manager: Box<dyn PackageManager>,
    constraints: ConstraintStore,
    index_urls: Vec<String>,
    environment: Option<PathBuf>,
}

impl PackageInstaller {
    pub fn new(manager: Box<dyn PackageManager>) -> Self {
        Self {
            manager,
            constraints: ConstraintStore::new(),
            index_urls: vec![DEFAULT_INDEX_URL.to_string()],
            environment: None,
        }
    }

    /// Set the managed environment directory installs target.
    pub fn with_environment(mut self, dir: impl Into<PathBuf>) -> Self {
        self.environment = Some(dir.into());
        self
    }

    pub fn environment(&self) -> Option<&Path> {
        self.environment.as_deref()
    }

    /// Replace the ordered index-URL list.
    pub fn set_index_urls(&mut self, urls: Vec<String>) {
        self.index_urls = urls;
    }

    pub fn index_urls(&self) -> &[String] {
        &self.index_urls
    }

    pub fn constraints(&self) -> &ConstraintStore {
        &self.constraints
    }

    /// Install a single package.
    ///
    /// Returns without any external invocation when the requested
    /// name/version is already present in the managed environment.
    /// A recorded constraint for the name is adopted as the effective
    /// version when the request does not carry one.
    pub fn install(&mut self, request: InstallRequest) -> Result<()> {
        let InstallRequest {
            name,
            mut version,
            develop,
            upgrade,
            install_options,
        } = request;

        if self.already_installed(&name, version.as_deref()) {
            debug!("{name} already satisfied, skipping install");
            return Ok(());
        }

        if develop && version.is_some() {
            return Err(PkgError::Config(
                "unable to set both version and develop flags when installing packages"
                    .to_string(),
            ));
        }

        if self.constraints.contains(&name) {
            if version.is_none() {
                version = self.constraints.get(&name).map(str::to_string);
            }
            // Re-derived as an exact pin from the fresh install below.
            self.constraints.remove(&name);
        }

        let requirement = if develop {
            format!("-e {name}")
        } else if let Some(version) = &version {
            format!("{name}{version}")
        } else {
            name.clone()
        };

        self.install_list(&[requirement], upgrade, &install_options)
    }

    /// Install a list of requirement strings under the current
    /// constraint snapshot, then re-pin the store from what the package
    /// manager reports as installed.
    pub fn install_list(
        &mut self,
        requirements: &[String],
        upgrade: bool,
        install_options: &[String],
    ) -> Result<()> {
        let constraints = self.constraints.snapshot();
        self.manager.install(InstallArgs {
            requirements,
            constraints: &constraints,
            upgrade,
            install_options,
            prefix: self.environment.as_deref(),
            index_urls: &self.index_urls,
        })?;

        // Full-snapshot overwrite: every reported package gets an exact
        // pin, not only the ones just requested.
        for (name, package) in self.manager.installed_packages()? {
            self.constraints.set(name, format!("=={}", package.version));
        }

        if let Some(env_dir) = &self.environment {
            env::make_relocatable(env_dir);
        }

        Ok(())
    }

    /// Uninstall a package that is currently installed in the managed
    /// environment. The constraint store is left untouched.
    pub fn uninstall(&mut self, name: &str) -> Result<()> {
        if !self.already_installed(name, None) {
            return Err(PkgError::Config(format!("{name} doesn't exist")));
        }
        self.manager.uninstall(name)
    }

    fn already_installed(&self, name: &str, version: Option<&str>) -> bool {
        let Some(env_dir) = &self.environment else {
            return false;
        };
        match version {
            None => env::is_installed(env_dir, name, None),
            // Only exact pins can be answered from metadata; ranged
            // specifiers go through the package manager.
            Some(specifier) => match specifier.strip_prefix("==") {
                Some(exact) => env::is_installed(env_dir, name, Some(exact.trim())),
                None => false,
            },
        }
    }
}
