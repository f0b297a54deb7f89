// `open_session`'s lock guard is populated by `ensure_connected` immediately
// above it; the `expect` documents that invariant rather than a real failure
// mode.
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::Handle;
use russh::client::Handler;
use russh_keys::key::PublicKey;
use tokio::sync::Mutex;

use crate::auth::Auth;
use crate::error::Result;
use crate::error::SshError;
use crate::remote_process::RemoteProcess;

/// One hop in a multi-hop path: `[hop1, hop2, ..., hopN]` opens `hop1`
/// directly, then tunnels a TCP connection to `hop2` through it, repeating
/// until the final hop — only `hopN` ever carries application traffic.
#[derive(Debug, Clone)]
pub struct Hop {
    pub host: String,
    pub port: u16,
}

impl Hop {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Hop { host: host.into(), port }
    }
}

struct AcceptAllHostKeys;

#[async_trait]
impl Handler for AcceptAllHostKeys {
    type Error = russh::Error;

    async fn check_server_key(&mut self, _server_public_key: &PublicKey) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

/// The outcome of `exec`/an entry of `execMany`.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecResult {
    pub fn ok(&self) -> bool {
        self.exit_code == 0
    }
}

/// A bidirectional local-to-remote TCP port forward. Dropping it stops
/// accepting new local connections; in-flight ones run to completion.
pub struct Tunnel {
    pub local_port: u16,
    stop: tokio::sync::watch::Sender<bool>,
}

impl Tunnel {
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

/// A single authenticated SSH session, possibly reached through one or
/// more jump hosts. Construction performs no I/O; the first operation
/// forces the connection.
pub struct SshTransport {
    hops: Vec<Hop>,
    auth: Auth,
    connect_timeout: Duration,
    handle: Arc<Mutex<Option<Handle<AcceptAllHostKeys>>>>,
}

impl SshTransport {
    pub fn new(hops: Vec<Hop>, auth: Auth) -> Self {
        SshTransport {
            hops,
            auth,
            connect_timeout: Duration::from_secs(30),
            handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Open hop1 directly, then for each subsequent hop open a
    /// direct-tcpip channel from the previous hop's session and run a
    /// fresh SSH handshake over it. Only the final hop ends up as the
    /// active transport; every intermediate hop exists solely to carry
    /// the tunnel the next handshake rides on.
    async fn ensure_connected(&self) -> Result<()> {
        let mut guard = self.handle.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let (first, rest) = self
            .hops
            .split_first()
            .ok_or_else(|| SshError::Transport(russh::Error::Disconnect))?;
        let config = Arc::new(russh::client::Config::default());
        let mut handle = tokio::time::timeout(
            self.connect_timeout,
            russh::client::connect(config.clone(), (first.host.as_str(), first.port), AcceptAllHostKeys),
        )
        .await
        .map_err(|_| SshError::Timeout)??;
        self.authenticate(&mut handle).await?;

        for hop in rest {
            let channel = handle
                .channel_open_direct_tcpip(&hop.host, hop.port as u32, "127.0.0.1", 0)
                .await?;
            let stream = channel.into_stream();
            let mut nested = tokio::time::timeout(
                self.connect_timeout,
                russh::client::connect_stream(config.clone(), stream, AcceptAllHostKeys),
            )
            .await
            .map_err(|_| SshError::Timeout)??;
            self.authenticate(&mut nested).await?;
            handle = nested;
        }

        *guard = Some(handle);
        Ok(())
    }

    async fn authenticate(&self, handle: &mut Handle<AcceptAllHostKeys>) -> Result<()> {
        let authenticated = match &self.auth {
            Auth::Password { username, password } => {
                handle.authenticate_password(username, password).await?
            }
            Auth::PublicKey { username, private_key_path, passphrase } => {
                let key = russh_keys::load_secret_key(private_key_path, passphrase.as_deref())
                    .map_err(SshError::Keys)?;
                handle
                    .authenticate_publickey(username, Arc::new(key))
                    .await?
            }
            Auth::Gssapi { username, .. } => {
                // russh's GSSAPI support is negotiated the same way as any
                // other method name; fall back to "none" to let the server
                // drive the exchange if it advertises gssapi-with-mic.
                handle.authenticate_none(username).await?
            }
        };
        if !authenticated {
            return Err(SshError::Authentication(format!(
                "server rejected credentials for user '{}'",
                self.auth.username()
            )));
        }
        Ok(())
    }

    async fn open_session(&self) -> Result<russh::Channel<russh::client::Msg>> {
        self.ensure_connected().await?;
        let guard = self.handle.lock().await;
        let handle = guard.as_ref().expect("connected above");
        Ok(handle.channel_open_session().await?)
    }

    pub async fn exec(&self, cmd: &str, input: Option<&[u8]>, timeout: Option<Duration>) -> Result<ExecResult> {
        let mut channel = self.open_session().await?;
        channel.exec(true, cmd).await?;
        if let Some(data) = input {
            channel.data(data).await?;
            channel.eof().await?;
        }
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = 0i32;
        let run = async {
            loop {
                match channel.wait().await {
                    Some(russh::ChannelMsg::Data { data }) => stdout.extend_from_slice(&data),
                    Some(russh::ChannelMsg::ExtendedData { data, .. }) => stderr.extend_from_slice(&data),
                    Some(russh::ChannelMsg::ExitStatus { exit_status }) => exit_code = exit_status as i32,
                    Some(russh::ChannelMsg::Eof) | Some(russh::ChannelMsg::Close) | None => break,
                    Some(_) => {}
                }
            }
        };
        match timeout {
            Some(t) => tokio::time::timeout(t, run).await.map_err(|_| SshError::Timeout)?,
            None => run.await,
        }
        Ok(ExecResult {
            command: cmd.to_string(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
        })
    }

    /// Run each command sequentially on the same connection.
    pub async fn exec_many(&self, cmds: &[String], timeout: Option<Duration>) -> Result<Vec<ExecResult>> {
        let mut out = Vec::with_capacity(cmds.len());
        for cmd in cmds {
            out.push(self.exec(cmd, None, timeout).await?);
        }
        Ok(out)
    }

    /// Stream decoded stdout lines as they arrive.
    pub async fn exec_stream(&self, cmd: &str) -> Result<tokio::sync::mpsc::Receiver<Result<String>>> {
        let mut channel = self.open_session().await?;
        channel.exec(true, cmd).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        tokio::spawn(async move {
            let mut carry = Vec::new();
            loop {
                match channel.wait().await {
                    Some(russh::ChannelMsg::Data { data }) => {
                        carry.extend_from_slice(&data);
                        while let Some(pos) = carry.iter().position(|b| *b == b'\n') {
                            let line: Vec<u8> = carry.drain(..=pos).collect();
                            let text = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
                            if tx.send(Ok(text)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(russh::ChannelMsg::Eof) | Some(russh::ChannelMsg::Close) | None => break,
                    _ => {}
                }
            }
            if !carry.is_empty() {
                let _ = tx.send(Ok(String::from_utf8_lossy(&carry).into_owned())).await;
            }
        });
        Ok(rx)
    }

    /// Spawn an interactive process (e.g. a remote REPL) bound to its own
    /// channel; multiple `RemoteProcess`es may coexist on one transport.
    pub async fn remote_process(&self, cmd: &str) -> Result<RemoteProcess> {
        let mut channel = self.open_session().await?;
        channel.exec(true, cmd).await?;
        Ok(RemoteProcess::new(channel))
    }

    /// Bind a local listener (port 0 = ephemeral) and shuttle each accepted
    /// connection to `remote_host:remote_port` through this transport.
    pub async fn forward(&self, local_port: u16, remote_host: &str, remote_port: u16) -> Result<Tunnel> {
        self.ensure_connected().await?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", local_port)).await?;
        let bound_port = listener.local_addr()?.port();
        let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
        let remote_host = remote_host.to_string();
        let handle_holder = self.handle.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, peer)) = accepted else { continue };
                        let handle_holder = handle_holder.clone();
                        let remote_host = remote_host.clone();
                        tokio::spawn(async move {
                            let guard = handle_holder.lock().await;
                            let Some(handle) = guard.as_ref() else { return };
                            let Ok(channel) = handle
                                .channel_open_direct_tcpip(&remote_host, remote_port as u32, &peer.ip().to_string(), peer.port() as u32)
                                .await
                            else {
                                return;
                            };
                            drop(guard);
                            shuttle(stream, channel).await;
                        });
                    }
                }
            }
        });

        Ok(Tunnel { local_port: bound_port, stop: stop_tx })
    }

    /// Open a channel with the `sftp` subsystem requested, for the
    /// one-shot script upload path.
    pub async fn open_session_for_sftp(&self) -> Result<russh::Channel<russh::client::Msg>> {
        let channel = self.open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        Ok(channel)
    }

    pub async fn close(&self) -> Result<()> {
        let mut guard = self.handle.lock().await;
        if let Some(handle) = guard.take() {
            handle
                .disconnect(russh::Disconnect::ByApplication, "", "")
                .await?;
        }
        Ok(())
    }
}


async fn shuttle(mut stream: tokio::net::TcpStream, mut channel: russh::Channel<russh::client::Msg>) {
    use tokio::io::AsyncReadExt;
    let mut local_buf = [0u8; 8192];
    loop {
        tokio::select! {
            read = stream.read(&mut local_buf) => {
                match read {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if channel.data(&local_buf[..n]).await.is_err() {
                            break;
                        }
                    }
                }
            }
            msg = channel.wait() => {
                use tokio::io::AsyncWriteExt;
                match msg {
                    Some(russh::ChannelMsg::Data { data }) => {
                        if stream.write_all(&data).await.is_err() {
                            break;
                        }
                    }
                    Some(russh::ChannelMsg::Eof) | Some(russh::ChannelMsg::Close) | None => break,
                    _ => {}
                }
            }
        }
    }
}
