pub mod build;
pub mod install;
pub mod list;
pub mod uninstall;

use indicatif::{ProgressBar, ProgressStyle};
use protium_config::{ProjectConfig, PROJECT_FILE};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Load the project file from the working directory when present;
/// install-style commands fall back to defaults without one.
pub(crate) fn load_optional_config() -> anyhow::Result<ProjectConfig> {
    if Path::new(PROJECT_FILE).exists() {
        Ok(ProjectConfig::load(PROJECT_FILE)?)
    } else {
        Ok(ProjectConfig::default())
    }
}

/// The managed environment installs target: the configured directory
/// (resolved against the build root), or the active virtualenv.
pub(crate) fn resolve_environment(
    configured: Option<&Path>,
    root: &Path,
) -> Option<PathBuf> {
    match configured {
        Some(dir) if dir.is_absolute() => Some(dir.to_path_buf()),
        Some(dir) => Some(root.join(dir)),
        None => std::env::var_os("VIRTUAL_ENV").map(PathBuf::from),
    }
}

/// Spinner shown while the package manager runs. Hidden on non-TTY
/// output.
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_environment_prefers_configured_dir() {
        let resolved = resolve_environment(Some(Path::new("env")), Path::new("/build"));
        assert_eq!(resolved.as_deref(), Some(Path::new("/build/env")));

        let resolved = resolve_environment(Some(Path::new("/opt/env")), Path::new("/build"));
        assert_eq!(resolved.as_deref(), Some(Path::new("/opt/env")));
    }
}
