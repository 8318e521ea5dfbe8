use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use protium::{commands, logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "protium")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Build-environment assembler",
    long_about = "Protium installs versioned packages into a managed environment \
                  and runs a declarative, phase-ordered build lifecycle."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the build lifecycle from a project file
    Build {
        /// Project file (default: protium.yaml)
        file: Option<PathBuf>,
    },
    /// Install a package into the managed environment
    Install {
        package: String,
        /// Full version specifier, e.g. "==1.2.0"
        #[arg(long)]
        version: Option<String>,
        /// Install in editable mode (-e)
        #[arg(short, long, conflicts_with = "version")]
        editable: bool,
        /// Upgrade the package if it is already installed
        #[arg(short = 'U', long)]
        upgrade: bool,
    },
    /// Remove a package from the managed environment
    Uninstall { package: String },
    /// List installed packages
    List,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Build { file } => commands::build::handle_build(file),
        Commands::Install {
            package,
            version,
            editable,
            upgrade,
        } => commands::install::handle_install(&package, version, editable, upgrade),
        Commands::Uninstall { package } => commands::uninstall::handle_uninstall(&package),
        Commands::List => commands::list::handle_list(),
    };

    if let Err(e) = result {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}
