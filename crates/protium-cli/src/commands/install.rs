use colored::Colorize;
use protium_pkg::{InstallRequest, PackageInstaller, PipClient};
use std::time::Instant;

/// Install one package into the managed environment.
pub fn handle_install(
    package: &str,
    version: Option<String>,
    editable: bool,
    upgrade: bool,
) -> anyhow::Result<()> {
    let config = super::load_optional_config()?;
    let root = std::env::current_dir()?;

    let mut installer = PackageInstaller::new(Box::new(PipClient::discover()?));
    if let Some(env_dir) = super::resolve_environment(config.environment.as_deref(), &root) {
        installer = installer.with_environment(env_dir);
    }
    let indexes = config.index_urls()?;
    if !indexes.is_empty() {
        installer.set_index_urls(indexes);
    }

    let request = InstallRequest {
        name: package.to_string(),
        version,
        develop: editable,
        upgrade,
        install_options: Vec::new(),
    };

    let start = Instant::now();
    let spinner = super::spinner(&format!("Installing {package}"));
    let result = installer.install(request);
    spinner.finish_and_clear();
    result?;

    let elapsed_ms = start.elapsed().as_millis();
    let display = match installer.constraints().get(package) {
        Some(pin) => format!("{}{}", package.bold(), pin),
        None => format!("{}", package.bold()),
    };
    println!("{}", format!("Installed in {elapsed_ms}ms").dimmed());
    println!(" {} {}", "+".green().bold(), display);
    Ok(())
}
