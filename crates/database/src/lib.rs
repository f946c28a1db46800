//! # dumpTrac Database Crate
//!
//! Application-specific interface to the PostgreSQL database that stores bins and
//! the reports filed against them.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** all SQL lives here. The rest of the application talks to the
//!   [`BinRepository`] and [`ReportRepository`] traits and never sees a query.
//! - **Explicitly injected:** the pool is created by [`connect`] and handed to
//!   [`DbRepository::new`]; there is no global connection state.
//! - **Atomic writes:** every write runs in its own statement or transaction and
//!   returns the committed row.
//!
//! ## Public API
//!
//! - `connect`: establishes the connection pool from [`configuration::DatabaseConfig`].
//! - `run_migrations`: creates the `bins` and `reports` tables if they are absent.
//! - `DbRepository`: the PostgreSQL implementation of the repository traits.
//! - `DbError`: the error type returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{BinRepository, DbRepository, ReportRepository, Repository};
