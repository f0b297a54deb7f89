//! Generic file transfer over the transport's SFTP subsystem: list, stat,
//! get, put, remove. Distinct from `script::run_acl_script`, which opens
//! its own short-lived SFTP session just to stage and clean up one temp
//! file; this module is the general-purpose surface §4.E asks for.

use russh_sftp::client::SftpSession;

use crate::error::Result;
use crate::error::SshError;
use crate::transport::SshTransport;

/// One entry returned by `FileTransfer::list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// Metadata returned by `FileTransfer::stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub is_dir: bool,
    pub permissions: Option<u32>,
}

/// A short-lived SFTP session over one channel of an `SshTransport`.
/// Opened on demand by each method rather than held across calls, mirroring
/// how `script::run_acl_script` opens and discards its own SFTP channel.
pub struct FileTransfer<'a> {
    transport: &'a SshTransport,
}

impl<'a> FileTransfer<'a> {
    pub fn new(transport: &'a SshTransport) -> Self {
        FileTransfer { transport }
    }

    async fn open(&self) -> Result<SftpSession> {
        let channel = self.transport.open_session_for_sftp().await?;
        SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| SshError::Sftp(e.to_string()))
    }

    pub async fn list(&self, remote_dir: &str) -> Result<Vec<DirEntry>> {
        let sftp = self.open().await?;
        let entries = sftp
            .read_dir(remote_dir)
            .await
            .map_err(|e| SshError::Sftp(e.to_string()))?;
        Ok(entries
            .map(|entry| {
                let metadata = entry.metadata();
                DirEntry {
                    name: entry.file_name(),
                    size: metadata.size.unwrap_or(0),
                    is_dir: metadata.is_dir(),
                }
            })
            .collect())
    }

    pub async fn stat(&self, remote_path: &str) -> Result<FileStat> {
        let sftp = self.open().await?;
        let metadata = sftp
            .metadata(remote_path)
            .await
            .map_err(|e| SshError::Sftp(e.to_string()))?;
        Ok(FileStat {
            size: metadata.size.unwrap_or(0),
            is_dir: metadata.is_dir(),
            permissions: metadata.permissions,
        })
    }

    pub async fn get(&self, remote_path: &str) -> Result<Vec<u8>> {
        use tokio::io::AsyncReadExt;
        let sftp = self.open().await?;
        let mut file = sftp
            .open(remote_path)
            .await
            .map_err(|e| SshError::Sftp(e.to_string()))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.map_err(SshError::Io)?;
        Ok(buf)
    }

    pub async fn put(&self, remote_path: &str, data: &[u8]) -> Result<()> {
        use tokio::io::AsyncWriteExt;
        let sftp = self.open().await?;
        let mut file = sftp
            .create(remote_path)
            .await
            .map_err(|e| SshError::Sftp(e.to_string()))?;
        file.write_all(data).await.map_err(SshError::Io)?;
        file.shutdown().await.map_err(SshError::Io)?;
        Ok(())
    }

    pub async fn remove(&self, remote_path: &str) -> Result<()> {
        let sftp = self.open().await?;
        sftp.remove_file(remote_path)
            .await
            .map_err(|e| SshError::Sftp(e.to_string()))
    }
}

impl SshTransport {
    /// Borrow a `FileTransfer` handle for list/stat/get/put/remove over
    /// this transport's SFTP subsystem.
    pub fn files(&self) -> FileTransfer<'_> {
        FileTransfer::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_entry_equality_is_structural() {
        let a = DirEntry { name: "x".to_string(), size: 4, is_dir: false };
        let b = DirEntry { name: "x".to_string(), size: 4, is_dir: false };
        assert_eq!(a, b);
    }
}
