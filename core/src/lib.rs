//! Shared data model and backend contract for the device control network
//! client: `Value`/`Reading`/`WriteResult`, composite error codes, the
//! `Backend`/`AsyncBackend` trait pair, and the buffered subscription
//! bridge that turns a backend's push-style arrival into pull-style
//! iteration.

mod backend;
mod capability;
mod errors;
mod reading;
mod subscription;
mod value;
mod write_result;

pub use backend::AsyncBackend;
pub use backend::Backend;
pub use backend::Setting;
pub use backend::SubscriptionId;
pub use capability::BackendCapability;
pub use errors::codes;
pub use errors::compose_error_code;
pub use errors::decompose_error_code;
pub use errors::normalize_error_code;
pub use errors::status_message;
pub use errors::CoreError;
pub use errors::Result;
pub use reading::Reading;
pub use subscription::async_subscription_channel;
pub use subscription::subscription_channel;
pub use subscription::AsyncSubscriptionHandle;
pub use subscription::SubscriptionDispatcher;
pub use subscription::SubscriptionHandle;
pub use subscription::SubscriptionMode;
pub use value::Value;
pub use write_result::WriteResult;
