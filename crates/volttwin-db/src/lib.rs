//! `PostgreSQL` state store for the Volttwin battery simulator.
//!
//! The store holds exactly one vehicle record (seeded by the migration)
//! and exposes the two operations the core needs: fetch the current
//! record and overwrite its mutable battery fields. This crate provides
//! the connection pool and the production implementation of the core's
//! `VehicleStateStore` trait.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool
//! - [`vehicle_store`] -- The `vehicle` table operations
//! - [`error`] -- Shared error types

pub mod error;
pub mod postgres;
pub mod vehicle_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::PostgresPool;
pub use vehicle_store::{VehicleRow, VehicleStore};
