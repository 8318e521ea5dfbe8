use colored::Colorize;
use protium_pkg::{PackageInstaller, PipClient};

/// Remove a package from the managed environment.
pub fn handle_uninstall(package: &str) -> anyhow::Result<()> {
    let config = super::load_optional_config()?;
    let root = std::env::current_dir()?;

    let mut installer = PackageInstaller::new(Box::new(PipClient::default()));
    if let Some(env_dir) = super::resolve_environment(config.environment.as_deref(), &root) {
        installer = installer.with_environment(env_dir);
    }

    installer.uninstall(package)?;
    println!(" {} {}", "-".red().bold(), package.bold());
    Ok(())
}
