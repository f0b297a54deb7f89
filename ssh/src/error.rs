use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("operation timed out")]
    Timeout,

    #[error("{0}")]
    Protocol(String),

    #[error("ssh transport error: {0}")]
    Transport(#[from] russh::Error),

    #[error("key error: {0}")]
    Keys(#[from] russh_keys::Error),

    #[error("sftp error: {0}")]
    Sftp(String),

    #[error("acl interpreter error: {0}")]
    Acl(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SshError>;
