//! Oracle node: shares one oracle key between attested enclaves running the
//! same binary, using a Cosmos chain as the only channel between them.
#![deny(clippy::nursery, clippy::pedantic, warnings, missing_docs)]

pub mod broadcaster;
pub mod cli;
pub mod commands;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod node;
pub mod observability;
pub mod protocol;
pub mod querier;

pub use error::OracleError;
