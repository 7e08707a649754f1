#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid argument: the payload is oversized or not a non-negative
    /// decimal integer.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Attribute is read-only: {0}")]
    ReadOnly(&'static str),
}
