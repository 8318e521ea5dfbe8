use protium_pkg::PkgError;
use thiserror::Error;

/// Errors raised by recipe implementations.
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Bad user input in a part's options. Logged at the phase boundary
    /// and skipped; the phase keeps running.
    #[error("{0}")]
    UserInput(String),

    /// Anything else a recipe fails with. Propagates unmodified and is
    /// fatal to the phase run.
    #[error("{0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("unknown part '{0}'")]
    UnknownPart(String),

    #[error("part '{0}' declares neither a recipe nor an isotope")]
    UndeclaredKind(String),

    #[error("part '{0}' has no recipe identifier")]
    MissingRecipe(String),

    #[error("no recipe registered for '{0}'")]
    UnknownRecipe(String),

    #[error("part '{part}' failed: {source}")]
    Recipe {
        part: String,
        #[source]
        source: RecipeError,
    },

    #[error(transparent)]
    Install(#[from] PkgError),
}

pub type Result<T> = std::result::Result<T, BuildError>;
