//! Contig Curator - Collaborative Assembly Curation Backend
//!
//! Moves contigs between curation projects through a reviewed transfer
//! workflow, with optimistic concurrency against a shared relational
//! store.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (ContigId, ProjectId, etc.)
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup
//! - [`store`] - Storage abstraction (in-memory and PostgreSQL backends)
//! - [`transfer`] - Transfer request workflow, lock protocol, HTTP API

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod logging;

// Storage and workflow
pub mod store;
pub mod transfer;

// Convenient re-exports at crate root
pub use core_types::{ContigId, ProjectId, RequestId, Username};
pub use store::{CurationStore, MemoryStore, PgStore};
pub use transfer::{
    Contig, ContigTransferRequest, LockProtocol, NotificationHub, Person, Project, RequestStatus,
    Role, TransferError, TransferWorkflow,
};
