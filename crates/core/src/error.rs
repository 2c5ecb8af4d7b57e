//! Result and Error types for geokit-core

/// Type alias for Result<T, core::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `geokit-core` crate
///
/// Every reader, writer and filter in the toolkit reports failures through
/// these kinds so that hosts can react consistently.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// File absent, permission denied, truncation
    #[error("failure in file I/O")]
    IoError(#[from] std::io::Error),

    /// Header malformed, unexpected token, non-numeric where numeric required
    #[error("{0}")]
    ParseError(String),

    /// Declared counts inconsistent with the data actually provided
    #[error("{message} (expected {expected:?}, found {found:?})")]
    SizeMismatch {
        message: String,
        expected: usize,
        found: usize,
    },

    /// Counts inconsistent in a way that is best explained in words
    #[error("{0}")]
    InvalidSize(String),

    /// Array name not present in any association
    #[error("{0}")]
    NotFound(String),

    /// Impossible parameter combination
    #[error("{0}")]
    InvalidArgument(String),

    /// The rotation estimator ran out of precision without converging
    #[error("{0}")]
    Precision(String),

    /// Failure from the csv backend
    #[error("failed to read delimited text")]
    CsvError(#[from] csv::Error),

    /// Failure loading or saving a json configuration
    #[error("invalid json configuration")]
    JsonError(#[from] serde_json::Error),

    /// Failure from the vtkio backend
    #[error("vtkio error")]
    VtkioError(#[from] vtkio::Error),

    /// Array could not be reshaped as requested
    #[error("incompatible array shape")]
    ShapeError(#[from] ndarray::ShapeError),
}

impl Error {
    /// Convenience for a [Error::SizeMismatch] with a message
    pub fn size_mismatch(message: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::SizeMismatch {
            message: message.into(),
            expected,
            found,
        }
    }
}

impl From<geokit_utils::Error> for Error {
    fn from(e: geokit_utils::Error) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}
