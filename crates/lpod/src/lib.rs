//! lpod — adapter driving the livepatch operator core.
//!
//! Each invocation handles one lifecycle event or one action against a
//! workload and an admin container, then records the resulting unit
//! status in the state store.
//!
//! # Components
//!
//! - **`event`** — lifecycle events
//! - **`operator`** — event dispatch and the apply path
//! - **`workload`** — `Workload` trait and the directory-backed `LocalWorkload`
//! - **`admin`** — `LocalAdmin`, running the schema tool as a local process
//! - **`tokens`** — lazy construction of the contracts token client

pub mod admin;
pub mod error;
pub mod event;
pub mod operator;
pub mod tokens;
pub mod workload;

pub use error::{OperatorError, OperatorResult};
pub use event::Event;
pub use operator::Operator;
pub use tokens::{ContractsFactory, TokenClientFactory};
pub use workload::{LocalWorkload, Workload};
