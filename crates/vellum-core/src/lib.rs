//! Core types and trait definitions for the Vellum governance store.
//!
//! Deliberately free of HTTP and database dependencies: every other crate
//! depends on this one, and storage backends plug in behind
//! [`store::VersionStore`].

pub mod actor;
pub mod audit;
pub mod error;
pub mod lifecycle;
pub mod rate_limit;
pub mod store;
pub mod timeline;
pub mod version;

pub use error::{Error, Result};
