//! Command-line driver for the external pip-style package manager.

use crate::errors::{PkgError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;
use url::Url;

/// One install invocation, fully specified by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallArgs<'a> {
    pub requirements: &'a [String],
    pub constraints: &'a [String],
    pub upgrade: bool,
    pub install_options: &'a [String],
    pub prefix: Option<&'a Path>,
    pub index_urls: &'a [String],
}

/// A package as reported by the manager's structured listing.
///
/// Recomputed on every query; never cached past it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Seam over the external package manager so callers (and tests) can
/// substitute the process-spawning implementation.
pub trait PackageManager {
    fn install(&self, args: InstallArgs<'_>) -> Result<()>;
    fn installed_packages(&self) -> Result<BTreeMap<String, InstalledPackage>>;
    fn uninstall(&self, name: &str) -> Result<()>;
}

/// Drives the real pip binary. One synchronous subprocess per operation,
/// no retries.
#[derive(Debug, Clone)]
pub struct PipClient {
    executable: PathBuf,
}

impl Default for PipClient {
    fn default() -> Self {
        Self::new("pip")
    }
}

impl PipClient {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Locate a pip binary on PATH.
    pub fn discover() -> Result<Self> {
        for candidate in ["pip", "pip3"] {
            if let Ok(path) = which::which(candidate) {
                debug!("using package manager at {}", path.display());
                return Ok(Self::new(path));
            }
        }
        Err(PkgError::Config(
            "no pip executable found on PATH".to_string(),
        ))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn exec(&self, args: &[String]) -> Result<ExecOutput> {
        debug!("running: {} {}", self.executable.display(), args.join(" "));
        let output = Command::new(&self.executable)
            .args(args)
            .output()
            .map_err(|e| PkgError::PackageManager {
                context: format!("failed to execute '{}'", self.executable.display()),
                output: e.to_string(),
            })?;

        let result = ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            return Err(PkgError::PackageManager {
                context: format!(
                    "'{} {}' failed with exit code {}",
                    self.executable.display(),
                    args.join(" "),
                    output.status.code().unwrap_or(-1)
                ),
                output: result.combined(),
            });
        }

        Ok(result)
    }
}

impl PackageManager for PipClient {
    fn install(&self, args: InstallArgs<'_>) -> Result<()> {
        // Written immediately before the invocation; Drop removes both
        // files on every exit path, success or failure.
        let constraints_file = write_spec_file(args.constraints)?;
        let requirements_file = write_spec_file(args.requirements)?;

        let argv = build_install_args(
            &args,
            constraints_file.as_ref().map(NamedTempFile::path),
            requirements_file.as_ref().map(NamedTempFile::path),
        );

        let output = self.exec(&argv)?;
        debug!("install output:\n{}", output.combined());
        Ok(())
    }

    fn installed_packages(&self) -> Result<BTreeMap<String, InstalledPackage>> {
        // --format=json needs pip 9 or newer.
        let output = self.exec(&["list".to_string(), "--format=json".to_string()])?;
        let listed: Vec<InstalledPackage> = serde_json::from_str(output.stdout.trim())
            .map_err(|e| PkgError::PackageManager {
                context: format!("could not parse package listing: {e}"),
                output: output.combined(),
            })?;

        Ok(listed
            .into_iter()
            .map(|package| (package.name.clone(), package))
            .collect())
    }

    fn uninstall(&self, name: &str) -> Result<()> {
        let output = self.exec(&[
            "uninstall".to_string(),
            "--yes".to_string(),
            name.to_string(),
        ])?;
        debug!("uninstall output:\n{}", output.combined());
        Ok(())
    }
}

struct ExecOutput {
    stdout: String,
    stderr: String,
}

impl ExecOutput {
    fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Assemble the install argv in its fixed order: upgrade flag, prefix,
/// install options, index URLs (primary then extras, each with its
/// trusted host), constraints file, requirements file.
fn build_install_args(
    args: &InstallArgs<'_>,
    constraints_file: Option<&Path>,
    requirements_file: Option<&Path>,
) -> Vec<String> {
    let mut argv = vec!["install".to_string()];

    if args.upgrade {
        argv.push("--upgrade".to_string());
    }

    if let Some(prefix) = args.prefix {
        argv.push("--prefix".to_string());
        argv.push(prefix.to_string_lossy().into_owned());
    }

    argv.extend(args.install_options.iter().cloned());

    if let Some((primary, extras)) = args.index_urls.split_first() {
        argv.push("-i".to_string());
        argv.push(primary.clone());
        argv.push("--trusted-host".to_string());
        argv.push(trusted_host(primary));
        for extra in extras {
            argv.push("--extra-index-url".to_string());
            argv.push(extra.clone());
            argv.push("--trusted-host".to_string());
            argv.push(trusted_host(extra));
        }
    }

    if let Some(path) = constraints_file {
        argv.push("-c".to_string());
        argv.push(path.to_string_lossy().into_owned());
    }

    if let Some(path) = requirements_file {
        argv.push("-r".to_string());
        argv.push(path.to_string_lossy().into_owned());
    }

    argv
}

/// Write entries to an ephemeral file, one per line, newline-joined.
/// Entries must not contain embedded newlines. Returns `None` when
/// there is nothing to write.
fn write_spec_file(entries: &[String]) -> Result<Option<NamedTempFile>> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut file = NamedTempFile::new()?;
    file.write_all(entries.join("\n").as_bytes())?;
    file.flush()?;
    Ok(Some(file))
}

/// Host (with port, when present) of an index URL, for `--trusted-host`.
fn trusted_host(index_url: &str) -> String {
    match Url::parse(index_url) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            }
        }
        Err(_) => index_url.to_string(),
    }
}
