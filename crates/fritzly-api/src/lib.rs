// fritzly-api: Async Rust client for the FRITZ!Box Lua status/control interface

pub mod auth;
pub mod error;
pub mod query;
pub mod session;
pub mod sid;
pub mod transport;

pub use auth::{Credentials, challenge_response};
pub use error::Error;
pub use query::{
    DEFAULT_MAX_URL_LENGTH, MAX_IN_FLIGHT, Partition, Progress, QueryCommand, QueryPlan,
    ResultMap,
};
pub use session::{Session, SessionOptions, SessionState};
pub use sid::SessionId;
pub use transport::{TlsMode, TransportConfig};
