//! # knohub-database
//!
//! The [`TreeStore`] contract the file tree engine depends on, with a
//! PostgreSQL implementation (connection pool, migrations, repositories)
//! and an in-process implementation for tests and single-node demos.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::memory::MemoryTreeStore;
pub use store::postgres::PgTreeStore;
pub use store::{TreeStore, TreeTransaction};
