//! Authenticated SSH transport with multi-hop jumping, command exec,
//! byte-level interactive process channels, port forwarding, and a
//! persistent `acl` interpreter session built on top of it.

mod acl_session;
mod auth;
mod error;
mod remote_process;
mod script;
mod sftp;
mod transport;

pub use acl_session::AclSession;
pub use auth::Auth;
pub use error::Result;
pub use error::SshError;
pub use remote_process::RemoteProcess;
pub use script::run_acl_script;
pub use sftp::DirEntry;
pub use sftp::FileStat;
pub use sftp::FileTransfer;
pub use transport::ExecResult;
pub use transport::Hop;
pub use transport::SshTransport;
pub use transport::Tunnel;
