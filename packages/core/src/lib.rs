//! Folio Core - content hierarchy management
//!
//! This crate keeps tree-shaped content nodes (pages, categories, sections)
//! consistent and navigable inside a collection.
//!
//! # Architecture
//!
//! - **Adjacency list**: each node stores only its `parent_id`; trees and
//!   breadcrumbs are derived on read
//! - **Checked writes**: slug uniqueness, parent existence and acyclicity are
//!   verified inside the same transaction that writes, under a per-collection lock
//! - **Pluggable storage**: `NodeStore` with an in-memory store and a
//!   libsql/Turso store (`turso` feature)
//!
//! # Modules
//!
//! - [`models`] - Data structures (ContentNode, TreeNode, Breadcrumb)
//! - [`services`] - HierarchyService, cycle guard, slug registry, publication filter
//! - [`db`] - Storage abstraction and implementations
//! - [`config`] - Service tunables

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::HierarchyConfig;
pub use models::*;
pub use services::*;
