// Poisoned mutex should fail the program.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use chrono::Local;
use serde_json::json;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::varint::write_varint;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("audit log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("flush_interval must be >= 1")]
    InvalidFlushInterval,
}

pub type Result<T> = std::result::Result<T, AuditError>;

struct Sinks {
    json: BufWriter<File>,
    binary: Option<BufWriter<File>>,
    writes_since_flush: u64,
}

/// Two co-located sinks for every request/response that passes through the
/// proxy: a human-grep-friendly JSON-lines file, and a wire-faithful
/// tagged-binary file (written only for messages the caller can serialize
/// to bytes). The binary sink itself is optional — a deployment that
/// never configures `proto_path` gets JSON-lines only.
pub struct AuditLog {
    sinks: Mutex<Sinks>,
    flush_interval: u64,
    next_seq: AtomicU64,
}

impl AuditLog {
    pub fn open(json_path: &Path, binary_path: Option<&Path>, flush_interval: u64) -> Result<Self> {
        if flush_interval == 0 {
            return Err(AuditError::InvalidFlushInterval);
        }
        let json = BufWriter::new(OpenOptions::new().create(true).append(true).open(json_path)?);
        let binary = binary_path
            .map(|p| -> Result<_> { Ok(BufWriter::new(OpenOptions::new().create(true).append(true).open(p)?)) })
            .transpose()?;
        Ok(AuditLog {
            sinks: Mutex::new(Sinks { json, binary, writes_since_flush: 0 }),
            flush_interval,
            next_seq: AtomicU64::new(1),
        })
    }

    /// Allocate the next monotonic sequence number, shared by a request
    /// and every response belonging to its stream.
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Log an inbound request. `final_drfs` should be `None` for a denied
    /// request (it never reached the backend) and `Some` only when
    /// policies rewrote the original `drfs`.
    #[allow(clippy::too_many_arguments)]
    pub fn log_request(
        &self,
        seq: u64,
        peer: &str,
        method: &str,
        drfs: &[String],
        allowed: bool,
        reason: Option<&str>,
        final_drfs: Option<&[String]>,
        binary_tag: Option<u8>,
        binary_payload: Option<&[u8]>,
    ) -> Result<()> {
        let mut entry = json!({
            "ts": Local::now().to_rfc3339(),
            "seq": seq,
            "dir": "in",
            "peer": peer,
            "method": method,
            "drfs": drfs,
            "allowed": allowed,
            "reason": reason,
        });
        if allowed {
            if let Some(final_drfs) = final_drfs {
                entry["final_drfs"] = json!(final_drfs);
            }
        }
        self.write_entry(entry, binary_tag, binary_payload)
    }

    /// Log a response (including one reading of a streamed subscription),
    /// sharing the inbound request's `seq`.
    pub fn log_response(
        &self,
        seq: u64,
        peer: &str,
        method: &str,
        payload: JsonValue,
        binary_tag: Option<u8>,
        binary_payload: Option<&[u8]>,
    ) -> Result<()> {
        let mut entry = json!({
            "ts": Local::now().to_rfc3339(),
            "seq": seq,
            "dir": "out",
            "peer": peer,
            "method": method,
        });
        if let JsonValue::Object(extra) = payload {
            if let JsonValue::Object(map) = &mut entry {
                map.extend(extra);
            }
        }
        self.write_entry(entry, binary_tag, binary_payload)
    }

    fn write_entry(&self, entry: JsonValue, binary_tag: Option<u8>, binary_payload: Option<&[u8]>) -> Result<()> {
        let mut sinks = self.sinks.lock().expect("audit log sinks poisoned");
        serde_json::to_writer(&mut sinks.json, &entry).map_err(std::io::Error::from)?;
        sinks.json.write_all(b"\n")?;

        if let (Some(tag), Some(payload), Some(binary)) = (binary_tag, binary_payload, sinks.binary.as_mut()) {
            let mut record = Vec::with_capacity(payload.len() + 6);
            record.push(tag);
            write_varint(&mut record, payload.len() as u64);
            record.extend_from_slice(payload);
            binary.write_all(&record)?;
        }

        sinks.writes_since_flush += 1;
        if sinks.writes_since_flush >= self.flush_interval {
            sinks.json.flush()?;
            if let Some(binary) = sinks.binary.as_mut() {
                binary.flush()?;
            }
            sinks.writes_since_flush = 0;
        }
        Ok(())
    }

    /// Flush pending writes. Idempotent.
    pub fn close(&self) -> Result<()> {
        let mut sinks = self.sinks.lock().expect("audit log sinks poisoned");
        sinks.json.flush()?;
        if let Some(binary) = sinks.binary.as_mut() {
            binary.flush()?;
        }
        sinks.writes_since_flush = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::tag::TAG_READ_REQUEST;
    use std::io::BufRead;

    fn open_log(dir: &tempfile::TempDir, flush_interval: u64) -> AuditLog {
        AuditLog::open(&dir.path().join("audit.jsonl"), Some(&dir.path().join("audit.bin")), flush_interval).unwrap()
    }

    #[test]
    fn json_only_when_binary_path_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(&dir.path().join("audit.jsonl"), None, 1).unwrap();
        log.log_request(1, "peer1", "Read", &["M:OUTTMP".to_string()], true, None, None, Some(TAG_READ_REQUEST), Some(b"x"))
            .unwrap();
        log.close().unwrap();
        assert!(!dir.path().join("audit.bin").exists());
        let contents = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn seq_numbers_are_monotonic_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir, 1);
        assert_eq!(log.next_seq(), 1);
        assert_eq!(log.next_seq(), 2);
        assert_eq!(log.next_seq(), 3);
    }

    #[test]
    fn denied_request_never_carries_final_drfs() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir, 1);
        log.log_request(1, "peer1", "Read", &["M:OUTTMP".to_string()], false, Some("denied"), None, None, None)
            .unwrap();
        log.close().unwrap();
        let contents = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
        let line = contents.lines().next().unwrap();
        let parsed: JsonValue = serde_json::from_str(line).unwrap();
        assert!(parsed.get("final_drfs").is_none());
        assert_eq!(parsed["allowed"], false);
    }

    #[test]
    fn rewritten_allowed_request_carries_final_drfs() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir, 1);
        let final_drfs = vec!["M:OUTTMP.READING".to_string()];
        log.log_request(1, "peer1", "Read", &["M:OUTTMP".to_string()], true, None, Some(&final_drfs), None, None)
            .unwrap();
        log.close().unwrap();
        let contents = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
        let parsed: JsonValue = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(parsed["final_drfs"], json!(["M:OUTTMP.READING"]));
    }

    #[test]
    fn binary_record_is_tag_length_payload() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir, 1);
        log.log_request(
            1,
            "peer1",
            "Read",
            &["M:OUTTMP".to_string()],
            true,
            None,
            None,
            Some(TAG_READ_REQUEST),
            Some(b"hello"),
        )
        .unwrap();
        log.close().unwrap();
        let bytes = std::fs::read(dir.path().join("audit.bin")).unwrap();
        assert_eq!(bytes[0], TAG_READ_REQUEST);
        assert_eq!(bytes[1], 5);
        assert_eq!(&bytes[2..], b"hello");
    }

    #[test]
    fn flush_interval_batches_writes() {
        let dir = tempfile::tempdir().unwrap();
        let log = open_log(&dir, 3);
        for _ in 0..2 {
            log.log_request(1, "peer1", "Read", &[], true, None, None, None, None).unwrap();
        }
        // Not yet flushed: file may be empty or partially buffered, but no error.
        log.close().unwrap();
        let reader = std::io::BufReader::new(std::fs::File::open(dir.path().join("audit.jsonl")).unwrap());
        assert_eq!(reader.lines().count(), 2);
    }
}
