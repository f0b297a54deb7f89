//! Read-only, batch-capable backend speaking the ACL/CGI gateway's
//! line-oriented HTTP protocol.

mod backend;
mod parser;
mod url;

pub use backend::HttpBackend;
pub use parser::is_error_response;
pub use parser::parse_line;
pub use parser::LineResult;
pub use url::build_batch_url;
pub use url::build_single_url;
pub use url::encode_device;
