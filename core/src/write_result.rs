use serde::Deserialize;
use serde::Serialize;

/// The outcome of a `write`/`writeMany` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResult {
    pub drf: String,
    pub facility: u8,
    pub error_code: i8,
    pub message: Option<String>,
    pub verified: Option<bool>,
    pub attempts: u32,
}

impl WriteResult {
    pub fn success(drf: impl Into<String>, attempts: u32) -> Self {
        WriteResult {
            drf: drf.into(),
            facility: 0,
            error_code: 0,
            message: None,
            verified: None,
            attempts,
        }
    }

    pub fn failure(
        drf: impl Into<String>,
        facility: u8,
        error_code: i8,
        message: impl Into<String>,
        attempts: u32,
    ) -> Self {
        WriteResult {
            drf: drf.into(),
            facility,
            error_code,
            message: Some(message.into()),
            verified: None,
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code == 0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn success_has_zero_error_code() {
        assert!(WriteResult::success("M:OUTTMP", 1).is_success());
    }

    #[test]
    fn failure_is_not_success() {
        assert!(!WriteResult::failure("M:OUTTMP", 17, -28, "invalid range", 1).is_success());
    }
}
