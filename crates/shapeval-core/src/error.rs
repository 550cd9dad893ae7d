use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A structural invariant of the shape tree does not hold (e.g. an OR
    /// with zero branches). Fatal for the whole validation pass.
    #[error("Malformed shape tree: {0}")]
    MalformedShapeTree(String),

    // The core crate does not do I/O; statement sources map their failures
    // into this variant so operators can propagate them unchanged.
    #[error("Upstream I/O failure: {0}")]
    UpstreamIo(String),

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Hash(e.to_string())
    }
}
