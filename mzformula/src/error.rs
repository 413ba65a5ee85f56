use thiserror::Error;

/// An error that might occur while validating formula search inputs.
///
/// Failing to find any formula is never an error, it just produces an
/// empty result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaSearchError {
    #[error("Coarseness level must be 1, 2, or 3, got {0}")]
    InvalidCoarsenessLevel(u8),
    #[error("Coarseness level must be 1, 2, 3, strict, moderate, or loose, got {0:?}")]
    UnknownCoarsenessLevel(String),
    #[error("Unsupported metal {0:?}, expected one of Y or La")]
    InvalidMetal(String),
    #[error("Unknown ion mode {0:?}, expected negative or positive")]
    InvalidIonMode(String),
}
