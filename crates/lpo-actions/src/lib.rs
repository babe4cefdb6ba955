//! lpo-actions — operator-invoked actions.
//!
//! Actions run against two external collaborators, both behind traits so
//! the handlers can be driven by fakes in tests:
//!
//! - [`AdminContainer`]: the sidecar that ships the schema tool.
//! - [`TokenService`]: the contracts service issuing machine and resource
//!   tokens.
//!
//! Handlers never return errors to their caller. Every failure is folded
//! into an [`ActionOutcome`], either as a failure message or as an `error`
//! result key.
//!
//! # Components
//!
//! - **`admin`** — `AdminContainer` trait, `ExecOutput`
//! - **`schema`** — schema tool invocation (`upgrade`, `check`)
//! - **`token`** — `TokenService` trait and the reqwest-backed `ContractsClient`
//! - **`handlers`** — `Action` parsing and the per-action handlers

pub mod admin;
pub mod error;
pub mod handlers;
pub mod schema;
pub mod token;

pub use admin::{AdminContainer, ExecOutput};
pub use error::{ActionError, ActionResult};
pub use handlers::{Action, ActionOutcome};
pub use schema::SchemaTool;
pub use token::{ContractsClient, TokenService};
