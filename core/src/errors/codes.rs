//! Curated registry of composite ACNET/FTP/DBM/DPM status codes, ported
//! verbatim from `pacsys/acnet/errors.py`. A composite code is
//! `facility + 256 * error_number`; see [`super::compose_error_code`] and
//! [`super::decompose_error_code`].

/// ACNET facility identifiers.
pub mod facility {
    pub const ACNET: u8 = 1;
    pub const DIO: u8 = 14;
    pub const FTP: u8 = 15;
    pub const DBM: u8 = 16;
    pub const DPM: u8 = 17;
}

use super::compose_error_code;

// ACNET facility (1) status codes.
pub const ACNET_OK: i32 = 0;
pub const ACNET_SUCCESS: i32 = 0;
pub const ACNET_DEPRECATED: i32 = compose_error_code(facility::ACNET, 4);
pub const ACNET_REPLY_TIMEOUT: i32 = compose_error_code(facility::ACNET, 3);
pub const ACNET_ENDMULT: i32 = compose_error_code(facility::ACNET, 2);
pub const ACNET_PEND: i32 = compose_error_code(facility::ACNET, 1);

pub const ACNET_RETRY: i32 = compose_error_code(facility::ACNET, -1);
pub const ACNET_NOLCLMEM: i32 = compose_error_code(facility::ACNET, -2);
pub const ACNET_NOREMMEM: i32 = compose_error_code(facility::ACNET, -3);
pub const ACNET_RPLYPACK: i32 = compose_error_code(facility::ACNET, -4);
pub const ACNET_REQPACK: i32 = compose_error_code(facility::ACNET, -5);
pub const ACNET_REQTMO: i32 = compose_error_code(facility::ACNET, -6);
pub const ACNET_QUEFULL: i32 = compose_error_code(facility::ACNET, -7);
pub const ACNET_BUSY: i32 = compose_error_code(facility::ACNET, -8);
pub const ACNET_NOT_CONNECTED: i32 = compose_error_code(facility::ACNET, -21);
pub const ACNET_ARG: i32 = compose_error_code(facility::ACNET, -22);
pub const ACNET_IVM: i32 = compose_error_code(facility::ACNET, -23);
pub const ACNET_NO_SUCH: i32 = compose_error_code(facility::ACNET, -24);
pub const ACNET_REQREJ: i32 = compose_error_code(facility::ACNET, -25);
pub const ACNET_CANCELLED: i32 = compose_error_code(facility::ACNET, -26);
pub const ACNET_NAME_IN_USE: i32 = compose_error_code(facility::ACNET, -27);
pub const ACNET_NCR: i32 = compose_error_code(facility::ACNET, -28);
pub const ACNET_NO_NODE: i32 = compose_error_code(facility::ACNET, -30);
pub const ACNET_TRUNC_REQUEST: i32 = compose_error_code(facility::ACNET, -31);
pub const ACNET_TRUNC_REPLY: i32 = compose_error_code(facility::ACNET, -32);
pub const ACNET_NO_TASK: i32 = compose_error_code(facility::ACNET, -33);
pub const ACNET_DISCONNECTED: i32 = compose_error_code(facility::ACNET, -34);
pub const ACNET_LEVEL2: i32 = compose_error_code(facility::ACNET, -35);
pub const ACNET_HARD_IO: i32 = compose_error_code(facility::ACNET, -36);
pub const ACNET_NODE_DOWN: i32 = compose_error_code(facility::ACNET, -42);
pub const ACNET_UTIME: i32 = compose_error_code(facility::ACNET, -49);
pub const ACNET_INVARG: i32 = compose_error_code(facility::ACNET, -50);

// DBM facility (16) status codes.
pub const DBM_NOPROP: i32 = compose_error_code(facility::DBM, -13);

// FTP facility (15) status codes.
pub const FTP_COLLECTING: i32 = compose_error_code(facility::FTP, 4);
pub const FTP_WAIT_DELAY: i32 = compose_error_code(facility::FTP, 3);
pub const FTP_WAIT_EVENT: i32 = compose_error_code(facility::FTP, 2);
pub const FTP_PEND: i32 = compose_error_code(facility::FTP, 1);

pub const FTP_INVTYP: i32 = compose_error_code(facility::FTP, -1);
pub const FTP_INVSSDN: i32 = compose_error_code(facility::FTP, -2);
pub const FTP_FE_OUTOFMEM: i32 = compose_error_code(facility::FTP, -5);
pub const FTP_NOCHAN: i32 = compose_error_code(facility::FTP, -6);
pub const FTP_NO_DECODER: i32 = compose_error_code(facility::FTP, -7);
pub const FTP_FE_PLOTLIM: i32 = compose_error_code(facility::FTP, -8);
pub const FTP_INVNUMDEV: i32 = compose_error_code(facility::FTP, -9);
pub const FTP_ENDOFDATA: i32 = compose_error_code(facility::FTP, -10);
pub const FTP_FE_PLOTLEN: i32 = compose_error_code(facility::FTP, -11);
pub const FTP_INVREQLEN: i32 = compose_error_code(facility::FTP, -12);
pub const FTP_NO_DATA: i32 = compose_error_code(facility::FTP, -13);
pub const FTP_INVREQ: i32 = compose_error_code(facility::FTP, -14);
pub const FTP_BADEV: i32 = compose_error_code(facility::FTP, -15);
pub const FTP_BUMPED: i32 = compose_error_code(facility::FTP, -16);
pub const FTP_REROUTE: i32 = compose_error_code(facility::FTP, -17);
pub const FTP_UNSFREQ: i32 = compose_error_code(facility::FTP, -19);
pub const FTP_BIGDLY: i32 = compose_error_code(facility::FTP, -20);
pub const FTP_UNSDEV: i32 = compose_error_code(facility::FTP, -21);
pub const FTP_SOFTWARE: i32 = compose_error_code(facility::FTP, -22);
pub const FTP_NOTRDY: i32 = compose_error_code(facility::FTP, -23);
pub const FTP_ARCNET: i32 = compose_error_code(facility::FTP, -24);
pub const FTP_BADARM: i32 = compose_error_code(facility::FTP, -25);
pub const FTP_INVFREQ_FOR_HARDWARE: i32 = compose_error_code(facility::FTP, -26);
pub const FTP_BAD_PLOT_MODE: i32 = compose_error_code(facility::FTP, -27);
pub const FTP_NO_SUCH_DEVICE: i32 = compose_error_code(facility::FTP, -28);
pub const FTP_DEVICE_IN_USE: i32 = compose_error_code(facility::FTP, -29);
pub const FTP_FREQ_TOO_HIGH: i32 = compose_error_code(facility::FTP, -30);
pub const FTP_NO_SETUP: i32 = compose_error_code(facility::FTP, -31);
pub const FTP_UNSUPPORTED_PROP: i32 = compose_error_code(facility::FTP, -32);
pub const FTP_INVALID_CHANNEL: i32 = compose_error_code(facility::FTP, -33);
pub const FTP_NO_FIFO: i32 = compose_error_code(facility::FTP, -34);
pub const FTP_BAD_DATA_LENGTH: i32 = compose_error_code(facility::FTP, -35);
pub const FTP_BUFFER_OVERFLOW: i32 = compose_error_code(facility::FTP, -36);
pub const FTP_NO_EVENT_SUPPORT: i32 = compose_error_code(facility::FTP, -37);
pub const FTP_TRIGGER_ERROR: i32 = compose_error_code(facility::FTP, -38);
pub const FTP_INV_CLASS_DEF: i32 = compose_error_code(facility::FTP, -39);
pub const FTP_NO_RANDOM_ACCESS: i32 = compose_error_code(facility::FTP, -40);
pub const FTP_INVALID_OFFSET: i32 = compose_error_code(facility::FTP, -41);
pub const FTP_NO_SNAPSHOT: i32 = compose_error_code(facility::FTP, -42);
pub const FTP_EVENT_UNAVAILABLE: i32 = compose_error_code(facility::FTP, -43);
pub const FTP_NO_FTPMAN_INIT: i32 = compose_error_code(facility::FTP, -44);
pub const FTP_BADTIMES: i32 = compose_error_code(facility::FTP, -100);
pub const FTP_BADRESETS: i32 = compose_error_code(facility::FTP, -101);
pub const FTP_BADARG: i32 = compose_error_code(facility::FTP, -102);
pub const FTP_BADRPY: i32 = compose_error_code(facility::FTP, -103);

// DPM facility (17) status codes.
pub const DPM_PEND: i32 = compose_error_code(facility::DPM, 1);
pub const DPM_STALE: i32 = compose_error_code(facility::DPM, 2);
pub const DPM_BAD_REQUEST: i32 = compose_error_code(facility::DPM, -24);
pub const DPM_NO_SUCH_DEVICE: i32 = compose_error_code(facility::DPM, -26);
pub const DPM_NO_SUCH_PROP: i32 = compose_error_code(facility::DPM, -27);
pub const DPM_BAD_RANGE: i32 = compose_error_code(facility::DPM, -28);
pub const DPM_NO_SCALE: i32 = compose_error_code(facility::DPM, -31);
pub const DPM_BAD_EVENT: i32 = compose_error_code(facility::DPM, -33);
pub const DPM_INTERNAL_ERROR: i32 = compose_error_code(facility::DPM, -45);

// Decomposed error numbers (signed int8), for use directly as
// `Reading`/`WriteResult::error_code`.
pub const ERR_OK: i8 = 0;
pub const ERR_RETRY: i8 = -1;
pub const ERR_TIMEOUT: i8 = -6;
pub const ERR_NOPROP: i8 = -13;

/// Human-readable message for an FTP composite status code, positive
/// (informational) or negative (error). Falls back to a generic
/// description naming the decomposed facility/error pair when the code is
/// not in the curated table.
pub fn ftp_status_message(composite_status: i32) -> String {
    for (code, msg) in FTP_STATUS_MESSAGES {
        if *code == composite_status {
            return (*msg).to_string();
        }
    }
    let (fac, err) = super::decompose_error_code(composite_status);
    if fac != facility::FTP {
        format!("non-FTP status (facility={fac}, error={err})")
    } else {
        format!("unknown FTP status (error={err})")
    }
}

const FTP_STATUS_MESSAGES: &[(i32, &str)] = &[
    (FTP_COLLECTING, "collecting data"),
    (FTP_WAIT_DELAY, "waiting for arm delay"),
    (FTP_WAIT_EVENT, "waiting for arm event"),
    (FTP_PEND, "snapshot pending"),
    (FTP_INVTYP, "invalid request typecode"),
    (FTP_INVSSDN, "invalid SSDN"),
    (FTP_FE_OUTOFMEM, "front-end out of memory"),
    (FTP_NOCHAN, "no available MADC plot channels"),
    (FTP_NO_DECODER, "no available clock decoders"),
    (FTP_FE_PLOTLIM, "front-end plot limit exceeded"),
    (FTP_INVNUMDEV, "invalid number of devices"),
    (FTP_ENDOFDATA, "end of data"),
    (FTP_FE_PLOTLEN, "buffer length computation error"),
    (FTP_INVREQLEN, "invalid request length"),
    (FTP_NO_DATA, "no data from MADC"),
    (FTP_INVREQ, "retrieval doesn't match active setup"),
    (FTP_BADEV, "wrong set of clock events"),
    (FTP_BUMPED, "bumped by higher priority plot"),
    (FTP_REROUTE, "internal reroute error"),
    (FTP_UNSFREQ, "unsupported frequency"),
    (FTP_BIGDLY, "delay too long"),
    (FTP_UNSDEV, "unsupported device type"),
    (FTP_SOFTWARE, "internal software error"),
    (FTP_NOTRDY, "data not ready"),
    (FTP_ARCNET, "ARCNET communication error"),
    (FTP_BADARM, "bad arm value"),
    (FTP_INVFREQ_FOR_HARDWARE, "frequency unsupported by hardware"),
    (FTP_BAD_PLOT_MODE, "bad plot mode"),
    (FTP_NO_SUCH_DEVICE, "device not found for retrieval"),
    (FTP_DEVICE_IN_USE, "device already has active retrieval"),
    (FTP_FREQ_TOO_HIGH, "frequency exceeds front-end capability"),
    (FTP_NO_SETUP, "no matching setup for retrieval/restart"),
    (FTP_UNSUPPORTED_PROP, "unsupported property"),
    (FTP_INVALID_CHANNEL, "channel doesn't exist on device"),
    (FTP_NO_FIFO, "missing FIFO board"),
    (FTP_BAD_DATA_LENGTH, "invalid data length (expected 2 or 4)"),
    (FTP_BUFFER_OVERFLOW, "front-end buffer overflow"),
    (FTP_NO_EVENT_SUPPORT, "event-triggered sampling unsupported"),
    (FTP_TRIGGER_ERROR, "trigger definition error"),
    (FTP_INV_CLASS_DEF, "invalid class definition"),
    (FTP_NO_RANDOM_ACCESS, "random access not supported"),
    (FTP_INVALID_OFFSET, "non-zero data offset unsupported"),
    (FTP_NO_SNAPSHOT, "device doesn't support snapshots"),
    (FTP_EVENT_UNAVAILABLE, "clock event not available on front-end"),
    (FTP_NO_FTPMAN_INIT, "FTPMAN not initialized (send class query first)"),
    (FTP_BADTIMES, "UCD module timestamp error"),
    (FTP_BADRESETS, "device timestamp reset error"),
    (FTP_BADARG, "invalid argument"),
    (FTP_BADRPY, "invalid reply from front-end"),
];

/// A curated human-readable message for a composite status code, covering
/// `DBM_NOPROP`, `ACNET_REQTMO`, and the rest of the named non-FTP
/// constants above. Returns `None` for codes with no curated entry (the
/// generic [`super::status_message`] should be used as a fallback).
pub fn registry_message(composite_status: i32) -> Option<&'static str> {
    REGISTRY.iter().find(|(code, _)| *code == composite_status).map(|(_, msg)| *msg)
}

const REGISTRY: &[(i32, &str)] = &[
    (DBM_NOPROP, "property not found"),
    (ACNET_REQTMO, "request timeout (6.5 min)"),
    (ACNET_RETRY, "retryable I/O error"),
    (ACNET_NOT_CONNECTED, "not connected to network"),
    (ACNET_NO_NODE, "no such logical node"),
    (ACNET_NO_TASK, "no such destination task"),
    (ACNET_REQREJ, "request rejected"),
    (DPM_BAD_REQUEST, "malformed request"),
    (DPM_NO_SUCH_DEVICE, "device not found"),
    (DPM_NO_SUCH_PROP, "property not found"),
    (DPM_BAD_RANGE, "invalid range"),
    (DPM_NO_SCALE, "scaling not available"),
    (DPM_BAD_EVENT, "invalid event"),
    (DPM_INTERNAL_ERROR, "internal error"),
];
