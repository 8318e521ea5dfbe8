//! Managed-environment inspection and upkeep.
//!
//! Answers "is this package already present" straight from the
//! environment's `*.dist-info` metadata, with no package-manager
//! invocation, and keeps installed entry-point scripts usable after the
//! environment directory is physically moved.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A distribution found in the environment's site-packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub name: String,
    pub version: String,
}

/// Every `site-packages` directory under the environment.
fn site_packages_dirs(env_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(env_dir)
        .min_depth(1)
        .max_depth(4)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_dir() && entry.file_name() == "site-packages")
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Distributions recorded in the environment, read from
/// `<name>-<version>.dist-info` directory names.
pub fn installed_distributions(env_dir: &Path) -> Vec<Distribution> {
    let mut found = Vec::new();
    for site_packages in site_packages_dirs(env_dir) {
        let Ok(entries) = fs::read_dir(&site_packages) else {
            continue;
        };
        for entry in entries.flatten() {
            if let Some(dist) = entry
                .file_name()
                .to_str()
                .and_then(parse_dist_info_dir_name)
            {
                found.push(dist);
            }
        }
    }
    found
}

fn parse_dist_info_dir_name(dir_name: &str) -> Option<Distribution> {
    let stem = dir_name.strip_suffix(".dist-info")?;
    let (name, version) = stem.rsplit_once('-')?;
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some(Distribution {
        name: name.to_string(),
        version: version.to_string(),
    })
}

/// Case- and separator-insensitive comparison key, the way installed
/// distribution names are recorded on disk.
fn normalize(name: &str) -> String {
    name.to_lowercase().replace('-', "_")
}

/// Whether the environment already holds `name`, optionally at an exact
/// version. Reads metadata only; never invokes the package manager.
pub fn is_installed(env_dir: &Path, name: &str, version: Option<&str>) -> bool {
    let want = normalize(name);
    installed_distributions(env_dir).iter().any(|dist| {
        normalize(&dist.name) == want && version.map_or(true, |v| dist.version == v)
    })
}

/// Best-effort fix-up so the environment survives being physically
/// moved: rewrite script shebangs that point at an absolute interpreter
/// inside the environment to `#!/usr/bin/env` form. Idempotent; failures
/// are logged and never fatal.
pub fn make_relocatable(env_dir: &Path) {
    let bin_dir = env_dir.join("bin");
    let Ok(entries) = fs::read_dir(&bin_dir) else {
        debug!("no bin directory under {}, nothing to relocate", env_dir.display());
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Err(err) = relocate_script(&path, env_dir) {
            warn!("could not rewrite {}: {err}", path.display());
        }
    }
}

fn relocate_script(path: &Path, env_dir: &Path) -> std::io::Result<()> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        // Binary entry points have no shebang to rewrite.
        Err(_) => return Ok(()),
    };

    let Some((shebang, rest)) = content.split_once('\n') else {
        return Ok(());
    };
    let Some(interpreter) = shebang.strip_prefix("#!") else {
        return Ok(());
    };
    let interpreter = interpreter.trim();
    if !Path::new(interpreter).starts_with(env_dir) {
        return Ok(());
    }

    let program = Path::new(interpreter)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("python3");
    let rewritten = format!("#!/usr/bin/env {program}\n{rest}");
    fs::write(path, rewritten)?;
    debug!("rewrote shebang of {}", path.display());
    Ok(())
}
