//! lpo-relations — database credential resolution for the operator.
//!
//! Credentials arrive over one of two mutually exclusive relation
//! channels. The active channel is tracked as a tagged union
//! ([`DatabaseIntegration`]); every relation event goes through
//! [`DatabaseIntegration::apply`], which either yields the next state
//! (plus an optional connection string to persist) or rejects the event.
//!
//! # Components
//!
//! - **`descriptor`** — libpq keyword/value connection descriptors (legacy channel)
//! - **`dsn`** — `postgresql://` connection string assembly
//! - **`integration`** — channel state machine
//! - **`proxy`** — outbound proxy settings

pub mod descriptor;
pub mod dsn;
pub mod error;
pub mod integration;
pub mod proxy;

pub use descriptor::ConnectionDescriptor;
pub use dsn::build_connection_string;
pub use error::{RelationError, RelationResult};
pub use integration::{Channel, DatabaseIntegration, RelationEvent, Transition};
pub use proxy::ProxySettings;
