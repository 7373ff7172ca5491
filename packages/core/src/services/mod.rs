//! Business Services
//!
//! - `HierarchyService` - create/update/move/delete and navigation reads
//! - `SlugRegistry` - collection-scoped slug uniqueness
//! - `ancestry` - upward walks shared by the cycle guard and breadcrumbs
//! - `PublicationFilter` - visibility rules for public trees
//! - `CollectionLocks` - per-collection write serialization

pub mod ancestry;
pub mod collection_locks;
pub mod error;
pub mod hierarchy_service;
pub mod publication;
pub mod slug_registry;


pub use ancestry::{chain_depth, walk_to_root, would_cycle, NodeLookup, StoreLookup, TxnLookup, WalkOutcome, WalkStep};
pub use collection_locks::{CollectionGuard, CollectionLocks};
pub use error::{ErrorKind, HierarchyError};
pub use hierarchy_service::HierarchyService;
pub use publication::{AllStatuses, PublicationFilter, PublishedOnly, StatusFilter};
pub use slug_registry::SlugRegistry;
