/// Errors returned by code construction, encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FecError {
    /// `required`/`total` out of range, or a share number outside the code.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Input data is not a positive multiple of `required`, or shares disagree on length.
    #[error("invalid input length: expected {expected}, got {actual}")]
    InvalidInputLength {
        /// Length the operation needed (or a multiple of it).
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Fewer shares than `required` were supplied.
    #[error("not enough shares: need {needed}, got {got}")]
    InsufficientShares { needed: usize, got: usize },

    /// Field division or inversion by zero. Never reachable through the public API.
    #[error("division by zero in GF(256)")]
    DivisionByZero,

    /// More corrupted shares than the supplied redundancy can correct.
    #[error("too many errors to correct in column {column}")]
    Uncorrectable { column: usize },
}
