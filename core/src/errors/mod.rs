//! Error codes, the curated status registry, and the crate's top-level
//! error enum.

pub mod codes;

use thiserror::Error;

/// Compose a status code from a facility and a signed error number, per the
/// `facility + 256 * error_number` convention.
pub const fn compose_error_code(facility: u8, error_number: i8) -> i32 {
    facility as i32 + 256 * error_number as i32
}

/// Decompose a composite status code back into `(facility, error_number)`.
pub const fn decompose_error_code(code: i32) -> (u8, i8) {
    let facility = (code & 0xFF) as u8;
    let error_number = ((code >> 8) & 0xFF) as u8;
    (facility, normalize_error_code(error_number))
}

/// Map an unsigned byte error number onto the signed int8 convention used
/// throughout this crate (negative = error, zero = ok, positive = warning).
pub const fn normalize_error_code(code: u8) -> i8 {
    if code > 127 {
        (code as i32 - 256) as i8
    } else {
        code as i8
    }
}

/// Build a human-readable status message from decomposed facility/error
/// fields. Returns `None` for success.
pub fn status_message(facility: u8, error: i8) -> Option<String> {
    use std::cmp::Ordering;
    match error.cmp(&0) {
        Ordering::Less => Some(format!("device error (facility={facility}, error={error})")),
        Ordering::Greater => Some(format!("warning (facility={facility}, error={error})")),
        Ordering::Equal => None,
    }
}

/// Errors produced directly by this crate's own logic — distinct from
/// `Reading`/`WriteResult` error codes, which describe a backend's wire
/// response rather than a failure to even form or route the call.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("device error on '{drf}': {message}")]
    Device {
        drf: String,
        facility: u8,
        error_code: i8,
        message: String,
    },

    #[error("request to '{drf}' timed out")]
    Timeout { drf: String },

    #[error("invalid DRF request: {0}")]
    Drf(#[from] devnet_drf::DrfParseError),

    #[error("called readings() on a callback-mode subscription handle")]
    CallbackModeMismatch,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn compose_and_decompose_round_trip() {
        for facility in [1u8, 14, 15, 16, 17] {
            for error_number in [-128i8, -1, 0, 1, 127] {
                let code = compose_error_code(facility, error_number);
                assert_eq!(decompose_error_code(code), (facility, error_number));
            }
        }
    }

    #[test]
    fn normalize_matches_python_reference() {
        assert_eq!(normalize_error_code(0), 0);
        assert_eq!(normalize_error_code(127), 127);
        assert_eq!(normalize_error_code(128), -128);
        assert_eq!(normalize_error_code(255), -1);
    }
}
