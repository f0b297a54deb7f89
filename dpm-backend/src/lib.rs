mod backend;
mod connection;
mod envelope;
mod pool;

pub use backend::DpmBackend;
pub use connection::DpmConnection;
pub use envelope::Request;
pub use envelope::Response;
pub use envelope::ReadingWire;
pub use pool::DpmPool;
pub use pool::PooledConnection;
