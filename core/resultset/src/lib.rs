//! FILENAME: core/resultset/src/lib.rs
//! Result-set subsystem for Cubeboard.
//!
//! This crate models what comes back from the analytics API and how the
//! dashboard reshapes it: a query, the flat rows it returned, the
//! annotation describing each member, and the pivot accessors that turn
//! all of that into chart- and table-ready structures. It performs no
//! I/O; feeding it response bodies is the caller's job.
//!
//! Layers:
//! - `query`: The serializable query and pivot configuration (what we ask)
//! - `value`: Cell values and their JavaScript-compatible coercions (what cells hold)
//! - `schema`: Member annotations and table column descriptors (what fields mean)
//! - `resultset`: The loaded response and its pivot accessors (what came back)
//! - `error`: Response-level failures

pub mod query;
pub mod value;
pub mod schema;
pub mod resultset;
pub mod error;

pub use query::*;
pub use value::*;
pub use schema::*;
pub use resultset::*;
pub use error::ResultSetError;
