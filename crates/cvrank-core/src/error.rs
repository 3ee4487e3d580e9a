use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Weights that do not sum to 1.0, a requested language without a
    /// heading set, or any other setting that makes a run meaningless.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Batch of {requested} candidates exceeds the maximum of {max}")]
    Capacity { requested: usize, max: usize },

    /// The semantic encoder failed or exceeded its time budget.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
