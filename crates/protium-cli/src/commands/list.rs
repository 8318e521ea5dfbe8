use colored::Colorize;
use protium_pkg::{PackageManager, PipClient};

/// List packages the package manager reports as installed.
pub fn handle_list() -> anyhow::Result<()> {
    let pip = PipClient::discover()?;
    let packages = pip.installed_packages()?;

    if packages.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }

    for (name, package) in &packages {
        println!("{} {}", name.bold(), package.version.dimmed());
    }
    Ok(())
}
