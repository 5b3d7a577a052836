//! # TrackRecord Database Crate
//!
//! The PostgreSQL store behind the API. Users, the exercise catalog, workouts
//! and workout logs live here; the latter two are aggregates written together
//! with their item rows.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives in this crate. Callers work with the
//!   `core-types` models and never see a query.
//! - **Aggregates are atomic:** A workout or log and its items are written in
//!   one transaction. A failure on any item leaves no trace of the aggregate.
//! - **Ownership in the predicate:** Every read, update and delete of an owned
//!   row filters by the owner id, so another user's row is simply `NotFound`.
//! - **Bounded:** Each operation (or whole transaction) runs under a deadline.
//!
//! ## Public API
//!
//! - `connect` / `connect_lazy`: Build the connection pool from `DatabaseSettings`.
//! - `run_migrations`: Apply the embedded migrations.
//! - `DbRepository`: All data access methods.
//! - `DbError`: The error type returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_lazy, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, WorkoutLogFilter, DEFAULT_QUERY_TIMEOUT};
