use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use bytes::BytesMut;
use russh::client::Msg;
use russh::Channel;
use russh::ChannelMsg;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::error::SshError;

/// Interactive byte-stream wrapper around one SSH channel: send lines or
/// raw bytes, read up to a marker or for a fixed duration. Stderr is
/// drained opportunistically whenever stdout is read, so a chatty remote
/// process never deadlocks on a full stderr pipe.
pub struct RemoteProcess {
    channel: Mutex<Channel<Msg>>,
    stdout_buf: Mutex<BytesMut>,
    alive: AtomicBool,
}

impl RemoteProcess {
    pub(crate) fn new(channel: Channel<Msg>) -> Self {
        RemoteProcess {
            channel: Mutex::new(channel),
            stdout_buf: Mutex::new(BytesMut::new()),
            alive: AtomicBool::new(true),
        }
    }

    pub async fn send_line(&self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.send_bytes(&data).await
    }

    pub async fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        let channel = self.channel.lock().await;
        channel.data(bytes).await?;
        Ok(())
    }

    /// Accumulate channel output until `marker` is seen, consuming it, and
    /// return everything before it. Handles a marker split across receive
    /// chunks by always searching the whole accumulated buffer. Fails with
    /// `SshError::Protocol("Process exited")` if the channel closes first.
    pub async fn read_until(&self, marker: &[u8], timeout: Option<Duration>) -> Result<Vec<u8>> {
        let deadline = timeout.map(|d| Instant::now() + d);
        loop {
            {
                let mut buf = self.stdout_buf.lock().await;
                if let Some(pos) = find_subslice(&buf, marker) {
                    let out = buf.split_to(pos).to_vec();
                    let _marker = buf.split_to(marker.len());
                    return Ok(out);
                }
            }
            let remaining = match deadline {
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        return Err(SshError::Timeout);
                    }
                    Some(d - now)
                }
                None => None,
            };
            if !self.pump_once(remaining).await? {
                return Err(SshError::Protocol("Process exited".to_string()));
            }
        }
    }

    /// Read whatever arrives for `duration`, then return it verbatim.
    pub async fn read_for(&self, duration: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            if !self.pump_once(Some(remaining)).await? {
                break;
            }
        }
        let mut buf = self.stdout_buf.lock().await;
        Ok(std::mem::take(&mut *buf).to_vec())
    }

    pub fn alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub async fn close(&self) -> Result<()> {
        let channel = self.channel.lock().await;
        channel.close().await?;
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Receive one channel event, feeding stdout into the buffer and
    /// discarding stderr. Returns `false` if the channel signaled
    /// end-of-stream/exit.
    async fn pump_once(&self, timeout: Option<Duration>) -> Result<bool> {
        let mut channel = self.channel.lock().await;
        let next = match timeout {
            Some(t) => match tokio::time::timeout(t, channel.wait()).await {
                Ok(msg) => msg,
                Err(_) => return Err(SshError::Timeout),
            },
            None => channel.wait().await,
        };
        match next {
            Some(ChannelMsg::Data { data }) => {
                drop(channel);
                self.stdout_buf.lock().await.extend_from_slice(&data);
                Ok(true)
            }
            Some(ChannelMsg::ExtendedData { data, .. }) => {
                // Stderr is drained and discarded to keep the remote side
                // from blocking on a full pipe.
                let _ = data;
                Ok(true)
            }
            Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | Some(ChannelMsg::ExitStatus { .. }) | None => {
                drop(channel);
                self.alive.store(false, Ordering::SeqCst);
                Ok(false)
            }
            Some(_) => Ok(true),
        }
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
