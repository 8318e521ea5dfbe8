use anyhow::Context;
use colored::Colorize;
use protium_build::{BuildRunner, PartStatus, RecipeRegistry};
use protium_config::{ProjectConfig, PROJECT_FILE};
use protium_pkg::{PackageInstaller, PipClient};
use std::path::PathBuf;

/// Run the full build lifecycle described by a project file.
pub fn handle_build(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(|| PathBuf::from(PROJECT_FILE));
    let root = std::env::current_dir()?;

    let config = ProjectConfig::load(&path)
        .with_context(|| format!("could not load {}", path.display()))?;

    let errors = config.validate();
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("{} {}", "error:".red().bold(), error);
        }
        anyhow::bail!("{} is not valid", path.display());
    }

    let mut installer = PackageInstaller::new(Box::new(PipClient::default()));
    if let Some(env_dir) = super::resolve_environment(config.environment.as_deref(), &root) {
        tracing::debug!("managed environment: {}", env_dir.display());
        installer = installer.with_environment(env_dir);
    }
    let indexes = config.index_urls()?;
    if !indexes.is_empty() {
        installer.set_index_urls(indexes);
    }

    let mut runner = BuildRunner::new(
        &root,
        &config,
        &mut installer,
        RecipeRegistry::with_builtins(),
    );
    let outcomes = runner.run()?;

    for outcome in &outcomes {
        match &outcome.status {
            PartStatus::Installed => {
                println!(" {} {}", "✔".green().bold(), outcome.part);
            }
            PartStatus::UserError(message) => {
                println!(" {} {} {}", "✗".red().bold(), outcome.part, message.dimmed());
            }
            PartStatus::Unimplemented(kind) => {
                println!(
                    " {} {} {}",
                    "-".bold(),
                    outcome.part,
                    format!("({kind} parts are not implemented)").dimmed()
                );
            }
        }
    }

    println!("{}", "Build finished".bold());
    Ok(())
}
