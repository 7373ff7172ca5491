//! Database Layer
//!
//! This module handles node persistence:
//!
//! - `NodeStore` / `NodeTransaction` - storage abstraction used by the services
//! - `MemoryStore` - in-process implementation (tests, embedding, dev mode)
//! - `TursoStore` - durable libsql implementation (`turso` feature)
//! - `HierarchyEvent` - domain events emitted after committed mutations

#[cfg(feature = "turso")]
mod database;
#[cfg(feature = "turso")]
mod error;
pub mod events;
mod memory_store;
mod node_store;
#[cfg(feature = "turso")]
mod turso_store;

#[cfg(feature = "turso")]
pub use database::DatabaseService;
#[cfg(feature = "turso")]
pub use error::DatabaseError;
pub use events::HierarchyEvent;
pub use memory_store::MemoryStore;
pub use node_store::{sort_by_title, NodeStore, NodeTransaction};
#[cfg(feature = "turso")]
pub use turso_store::TursoStore;
