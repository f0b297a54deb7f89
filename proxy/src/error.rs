use thiserror::Error;
use tonic::Status;

/// Errors this crate's own logic can produce, distinct from whatever the
/// upstream backend or the wire transport raise — those are mapped
/// straight to a [`tonic::Status`] at the RPC boundary instead of being
/// wrapped here.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Audit(#[from] devnet_audit::AuditError),

    #[error(transparent)]
    Transport(#[from] tonic::transport::Error),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Map a backend-level [`devnet_core::CoreError`] onto the RPC status code
/// the inbound client sees, per the proxy's error-mapping contract:
/// device errors abort with the composite code embedded in the message,
/// unsupported operations are unimplemented, and timeouts are
/// deadline-exceeded.
pub fn core_error_to_status(err: &devnet_core::CoreError) -> Status {
    use devnet_core::CoreError;
    match err {
        CoreError::UnsupportedOperation(op) => Status::unimplemented(*op),
        CoreError::Device { drf, facility, error_code, message } => Status::aborted(format!(
            "device error on '{drf}': facility={facility} error_code={error_code} message={message}"
        )),
        CoreError::Timeout { drf } => Status::deadline_exceeded(format!("request to '{drf}' timed out")),
        CoreError::Drf(e) => Status::invalid_argument(e.to_string()),
        CoreError::CallbackModeMismatch => Status::internal(err.to_string()),
        CoreError::Other(msg) => Status::internal(msg.clone()),
    }
}
