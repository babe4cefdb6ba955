//! lpo-state — durable state for the livepatch operator.
//!
//! Backed by [redb](https://docs.rs/redb). Two tables are kept:
//!
//! - `peer`: values shared by every replica (resolved connection string,
//!   resource token). Only the leader replica may write them; writes go
//!   through a [`LeaderWriter`] obtained with an explicit leadership check.
//! - `unit`: records private to this replica (relation channel state,
//!   last reported status), JSON-serialized.
//!
//! The `StateStore` is `Clone` (backed by `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::{LeaderWriter, StateStore};
pub use types::*;
