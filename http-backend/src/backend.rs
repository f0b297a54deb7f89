use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use devnet_core::codes;
use devnet_core::AsyncBackend;
use devnet_core::Backend;
use devnet_core::BackendCapability;
use devnet_core::CoreError;
use devnet_core::Reading;
use devnet_core::Result;
use devnet_core::Setting;
use devnet_core::SubscriptionId;
use devnet_core::Value;
use devnet_core::WriteResult;
use devnet_drf::ensure_immediate_event;

use crate::parser::is_error_response;
use crate::parser::parse_line;
use crate::parser::LineResult;
use crate::url::build_batch_url;
use crate::url::build_single_url;

const UNSUPPORTED: &str = "HTTP CGI backend supports only batched reads";

/// Read-only, batch-capable backend for the ACL/CGI gateway. Holds one
/// blocking and one async `reqwest` client, each built once and reused
/// across calls so TCP connections stay warm.
pub struct HttpBackend {
    base_url: String,
    blocking: reqwest::blocking::Client,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpBackend {
            base_url: base_url.into(),
            blocking: reqwest::blocking::Client::new(),
            client: reqwest::Client::new(),
        }
    }

    fn line_to_reading(drf: &str, line: &str) -> Reading {
        let now = Local::now();
        match parse_line(line) {
            LineResult::Error(message) => Reading::error(drf, 0, codes::ERR_RETRY, message, now),
            LineResult::Value(value) => Reading::ok(drf, value, now),
        }
    }

    fn one_shot(drf: &str) -> Result<String> {
        Ok(ensure_immediate_event(drf)?)
    }
}

#[async_trait]
impl AsyncBackend for HttpBackend {
    fn capabilities(&self) -> BackendCapability {
        BackendCapability::READ | BackendCapability::BATCH
    }

    async fn get(&self, drf: &str, timeout: Option<Duration>) -> Result<Reading> {
        let resolved = Self::one_shot(drf)?;
        let url = build_single_url(&self.base_url, &resolved);
        let mut req = self.client.get(&url);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let resp = req.send().await.map_err(|e| transport_error(drf, &e))?;
        let body = resp.text().await.map_err(|e| transport_error(drf, &e))?;
        let line = body.lines().next().unwrap_or("");
        Ok(Self::line_to_reading(drf, line))
    }

    async fn get_many(&self, drfs: &[String], timeout: Option<Duration>) -> Result<Vec<Reading>> {
        let resolved: Vec<String> = drfs.iter().map(|d| Self::one_shot(d)).collect::<Result<_>>()?;
        let url = build_batch_url(&self.base_url, &resolved);
        let mut req = self.client.get(&url);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let body = match req.send().await {
            Ok(resp) => resp.text().await.map_err(|e| transport_error("batch", &e))?,
            Err(e) => return Err(transport_error("batch", &e)),
        };
        let lines: Vec<&str> = body.lines().collect();
        let needs_fallback = lines.len() != drfs.len() || lines.iter().any(|l| is_error_response(l));
        if needs_fallback {
            let mut out = Vec::with_capacity(drfs.len());
            for drf in drfs {
                out.push(self.get(drf, timeout).await?);
            }
            return Ok(out);
        }
        Ok(drfs
            .iter()
            .zip(lines)
            .map(|(drf, line)| Self::line_to_reading(drf, line))
            .collect())
    }

    async fn write(&self, _drf: &str, _value: Value, _timeout: Option<Duration>) -> Result<WriteResult> {
        Err(CoreError::UnsupportedOperation(UNSUPPORTED))
    }

    async fn write_many(&self, _settings: &[Setting], _timeout: Option<Duration>) -> Result<Vec<WriteResult>> {
        Err(CoreError::UnsupportedOperation(UNSUPPORTED))
    }

    async fn subscribe(
        &self,
        _drfs: &[String],
    ) -> Result<(SubscriptionId, devnet_core::AsyncSubscriptionHandle)> {
        Err(CoreError::UnsupportedOperation(UNSUPPORTED))
    }

    async fn remove(&self, _id: SubscriptionId) -> Result<()> {
        Err(CoreError::UnsupportedOperation(UNSUPPORTED))
    }

    async fn stop_streaming(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

impl Backend for HttpBackend {
    fn capabilities(&self) -> BackendCapability {
        BackendCapability::READ | BackendCapability::BATCH
    }

    fn get(&self, drf: &str, timeout: Option<Duration>) -> Result<Reading> {
        let resolved = Self::one_shot(drf)?;
        let url = build_single_url(&self.base_url, &resolved);
        let mut req = self.blocking.get(&url);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let resp = req.send().map_err(|e| transport_error(drf, &e))?;
        let body = resp.text().map_err(|e| transport_error(drf, &e))?;
        let line = body.lines().next().unwrap_or("");
        Ok(Self::line_to_reading(drf, line))
    }

    fn get_many(&self, drfs: &[String], timeout: Option<Duration>) -> Result<Vec<Reading>> {
        let resolved: Vec<String> = drfs.iter().map(|d| Self::one_shot(d)).collect::<Result<_>>()?;
        let url = build_batch_url(&self.base_url, &resolved);
        let mut req = self.blocking.get(&url);
        if let Some(t) = timeout {
            req = req.timeout(t);
        }
        let body = match req.send() {
            Ok(resp) => resp.text().map_err(|e| transport_error("batch", &e))?,
            Err(e) => return Err(transport_error("batch", &e)),
        };
        let lines: Vec<&str> = body.lines().collect();
        let needs_fallback = lines.len() != drfs.len() || lines.iter().any(|l| is_error_response(l));
        if needs_fallback {
            let mut out = Vec::with_capacity(drfs.len());
            for drf in drfs {
                out.push(self.get(drf, timeout)?);
            }
            return Ok(out);
        }
        Ok(drfs
            .iter()
            .zip(lines)
            .map(|(drf, line)| Self::line_to_reading(drf, line))
            .collect())
    }

    fn write(&self, _drf: &str, _value: Value, _timeout: Option<Duration>) -> Result<WriteResult> {
        Err(CoreError::UnsupportedOperation(UNSUPPORTED))
    }

    fn write_many(&self, _settings: &[Setting], _timeout: Option<Duration>) -> Result<Vec<WriteResult>> {
        Err(CoreError::UnsupportedOperation(UNSUPPORTED))
    }

    fn subscribe(&self, _drfs: &[String]) -> Result<(SubscriptionId, devnet_core::SubscriptionHandle)> {
        Err(CoreError::UnsupportedOperation(UNSUPPORTED))
    }

    fn remove(&self, _id: SubscriptionId) -> Result<()> {
        Err(CoreError::UnsupportedOperation(UNSUPPORTED))
    }

    fn stop_streaming(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn transport_error(drf: &str, e: &reqwest::Error) -> CoreError {
    if e.is_timeout() {
        CoreError::Timeout { drf: drf.to_string() }
    } else {
        CoreError::Device {
            drf: drf.to_string(),
            facility: 0,
            error_code: codes::ERR_RETRY,
            message: e.to_string(),
        }
    }
}
