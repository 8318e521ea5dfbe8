//! Package installation for protium builds.
//!
//! Wraps the external pip-style package manager behind the
//! [`PackageManager`] seam and layers version-constraint tracking,
//! idempotency, and managed-environment upkeep on top of it in
//! [`PackageInstaller`].

mod constraints;
mod env;
mod errors;
mod installer;
mod pip;

pub use constraints::ConstraintStore;
pub use env::{installed_distributions, is_installed, make_relocatable, Distribution};
pub use errors::{PkgError, Result};
pub use installer::{InstallRequest, PackageInstaller, DEFAULT_INDEX_URL};
pub use pip::{InstallArgs, InstalledPackage, PackageManager, PipClient};
