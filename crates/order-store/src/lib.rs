//! Persistence for order aggregates.
//!
//! The [`OrderRepository`] trait is the port the orchestrators depend on.
//! Two implementations are provided: an in-memory store for tests and local
//! runs, and a PostgreSQL store. Both enforce optimistic concurrency through
//! the order's version.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderRepository;
pub use postgres::PostgresOrderRepository;
pub use repository::OrderRepository;
