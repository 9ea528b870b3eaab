//! Status model and router facade on top of `fritzly-api`.
//!
//! - **[`Router`]**: owns the session, serializes top-level operations,
//!   and exposes [`query()`](Router::query), [`fetch()`](Router::fetch),
//!   [`submit()`](Router::submit), and [`status()`](Router::status).
//!   [`Router::oneshot()`] wraps a connect/run/logout cycle for single CLI
//!   invocations.
//!
//! - **Marshalling** ([`marshal`]): types implement [`Queryable`] to
//!   declare which query command fills which member and through which
//!   named converter. Nested objects are included with
//!   [`Scope::propagate`]; the whole graph is fetched in one batched query.
//!
//! - **Domain model** ([`model`]): [`BoxInfo`], [`DslStatus`],
//!   [`WanStatus`], and [`WlanStatus`], aggregated by [`RouterStatus`].

pub mod config;
pub mod converters;
pub mod error;
pub mod marshal;
pub mod model;
pub mod router;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, TlsVerification};
pub use error::CoreError;
pub use marshal::{
    Converter, FieldDescriptor, MAX_PROPAGATION_DEPTH, Marshaller, QuerySource, Queryable, Scope,
    marshal,
};
pub use model::{BoxInfo, DslStatus, RouterStatus, WanStatus, WlanStatus};
pub use router::Router;

pub use fritzly_api::SessionState;
