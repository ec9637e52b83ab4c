#[derive(thiserror::Error, Debug)]
pub enum SearchCryptoError {
    /// Gaussian elimination found no pivot in some column.
    #[error("SingularMatrix: {0}")]
    SingularMatrix(String),
    #[error("DimensionMismatch: {0}")]
    DimensionMismatch(String),
    #[error("InvalidParameters: {0}")]
    InvalidParameters(String),
    /// Wire-format input that does not describe a valid value.
    #[error("DecodingError: {0}")]
    DecodingError(String),
    #[error("InternalError: {0}")]
    InternalError(String),

    #[error("Data serialization: {0}")]
    SerializationError(#[from] serde_json::Error),
}
