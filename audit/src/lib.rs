//! The supervised proxy's audit trail: a human-readable JSON-lines sink
//! plus a wire-faithful tagged-binary sink, sharing one monotonic sequence
//! number per inbound request.

mod tag;
mod varint;
mod writer;

pub use tag::TAG_READ_REPLY;
pub use tag::TAG_READ_REQUEST;
pub use tag::TAG_SETTING_REPLY;
pub use tag::TAG_SETTING_REQUEST;
pub use varint::read_varint;
pub use varint::write_varint;
pub use writer::AuditError;
pub use writer::AuditLog;
pub use writer::Result;
