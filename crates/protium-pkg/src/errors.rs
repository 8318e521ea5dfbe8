use thiserror::Error;

#[derive(Error, Debug)]
pub enum PkgError {
    /// Invalid caller input. Never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// The external package manager could not be invoked, exited
    /// nonzero, or produced output that does not parse. Carries the
    /// captured output for diagnostics.
    #[error("{context}\n{output}")]
    PackageManager { context: String, output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PkgError>;
