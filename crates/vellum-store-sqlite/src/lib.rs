//! SQLite backend for the Vellum governance store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Internal failures fold into
//! [`vellum_core::Error::Storage`]; domain failures keep their precise
//! variants so the HTTP layer can map them to status codes.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;

#[cfg(test)]
mod tests;
