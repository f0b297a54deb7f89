use russh_sftp::client::SftpSession;

use crate::error::Result;
use crate::error::SshError;
use crate::transport::SshTransport;

/// Write `commands` to a temporary remote file over SFTP, run `acl
/// <tmpfile>`, capture stdout, and remove the file whether or not the run
/// succeeded — the guaranteed-cleanup step is a plain `finally`-shaped
/// call rather than a sync `Drop` guard, since the SFTP remove is itself
/// async.
pub async fn run_acl_script(transport: &SshTransport, commands: &[String]) -> Result<String> {
    let channel = transport.open_session_for_sftp().await?;
    let sftp = SftpSession::new(channel.into_stream())
        .await
        .map_err(|e| SshError::Sftp(e.to_string()))?;

    let remote_path = format!("/tmp/devnet-acl-{}.acl", std::process::id());
    let body = commands.join("\n");
    {
        use tokio::io::AsyncWriteExt;
        let mut file = sftp
            .create(&remote_path)
            .await
            .map_err(|e| SshError::Sftp(e.to_string()))?;
        file.write_all(body.as_bytes())
            .await
            .map_err(SshError::Io)?;
        file.shutdown().await.map_err(SshError::Io)?;
    }

    let result = transport.exec(&format!("acl {remote_path}"), None, None).await;
    let _ = sftp.remove_file(&remote_path).await;

    let exec = result?;
    Ok(exec.stdout)
}
