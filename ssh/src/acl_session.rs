use std::time::Duration;

use crate::error::Result;
use crate::error::SshError;
use crate::remote_process::RemoteProcess;
use crate::transport::SshTransport;

const PROMPT: &str = "\nACL> ";

/// A persistent session with the remote `acl` interpreter. The
/// interpreter does not keep variable state between [`AclSession::send`]
/// calls — each is an independent script (semicolons combine statements
/// within one call, nothing more).
pub struct AclSession {
    process: RemoteProcess,
}

impl AclSession {
    /// Spawn `acl` and drain its banner up to the first prompt. A timeout or
    /// a process exit before the prompt appears is an `ACLError` (§4.F); the
    /// half-open process is closed before the error is returned.
    pub async fn open(transport: &SshTransport, timeout: Option<Duration>) -> Result<Self> {
        let process = transport.remote_process("acl").await?;
        if let Err(e) = process.read_until(PROMPT.as_bytes(), timeout).await {
            let _ = process.close().await;
            return Err(SshError::Acl(format!("interpreter did not produce a prompt: {e}")));
        }
        Ok(AclSession { process })
    }

    /// Send one command and return its decoded, trimmed response with the
    /// echoed command line dropped. A timeout or process exit while waiting
    /// for the next prompt is an `ACLError`; the session is closed first.
    pub async fn send(&self, cmd: &str, timeout: Option<Duration>) -> Result<String> {
        self.process.send_line(cmd).await?;
        let raw = match self.process.read_until(PROMPT.as_bytes(), timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                let _ = self.process.close().await;
                return Err(SshError::Acl(format!("interpreter session closed: {e}")));
            }
        };
        let text = String::from_utf8_lossy(&raw);
        let without_echo = match text.split_once('\n') {
            Some((_echo, rest)) => rest,
            None => "",
        };
        Ok(without_echo.trim().to_string())
    }

    /// Close the channel only — the underlying transport, and any other
    /// session multiplexed on it, is left intact.
    pub async fn close(&self) -> Result<()> {
        self.process.close().await
    }
}
