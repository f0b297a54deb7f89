use thiserror::Error;

/// Deterministic DRF parse failure. Parsing is total: any syntactic
/// violation produces one of these instead of panicking.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid DRF '{text}' at position {position}: {cause}")]
pub struct DrfParseError {
    pub text: String,
    pub position: usize,
    pub cause: String,
}

impl DrfParseError {
    pub(crate) fn new(text: &str, position: usize, cause: impl Into<String>) -> Self {
        Self {
            text: text.to_string(),
            position,
            cause: cause.into(),
        }
    }
}
