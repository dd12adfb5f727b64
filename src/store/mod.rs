//! Curation Store
//!
//! The single seam to the relational store. Every mutation is an explicit
//! compare-and-swap whose `bool` result mirrors "affected-row count > 0":
//! the WHERE clause re-asserts the precondition the caller observed, and a
//! `false` return means the world changed underneath - a business outcome,
//! not an infrastructure fault (those surface as `TransferError::Storage`).
//!
//! Two implementations ship: [`PgStore`] against PostgreSQL and
//! [`MemoryStore`], an in-process double honouring the same atomicity
//! contract.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core_types::{ContigId, ProjectId, RequestId};
use crate::transfer::error::TransferError;
use crate::transfer::status::RequestStatus;
use crate::transfer::types::{Contig, ContigTransferRequest, NewRequest, Person, Project, StatusUpdate};

/// Storage operations consumed by the workflow and the lock protocol.
#[async_trait]
pub trait CurationStore: Send + Sync {
    // === Fetch-by-id ===

    async fn project(&self, id: ProjectId) -> Result<Option<Project>, TransferError>;

    async fn contig(&self, id: ContigId) -> Result<Option<Contig>, TransferError>;

    async fn person(&self, username: &str) -> Result<Option<Person>, TransferError>;

    async fn request(&self, id: RequestId)
        -> Result<Option<ContigTransferRequest>, TransferError>;

    /// The PENDING or APPROVED request holding a claim on `contig_id`, if any.
    /// At most one such request exists at a time (enforced at creation).
    async fn active_request_for_contig(
        &self,
        contig_id: ContigId,
    ) -> Result<Option<ContigTransferRequest>, TransferError>;

    /// All requests whose source or destination is `project_id`.
    async fn requests_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ContigTransferRequest>, TransferError>;

    /// All requests opened by `username`.
    async fn requests_for_user(
        &self,
        username: &str,
    ) -> Result<Vec<ContigTransferRequest>, TransferError>;

    // === Writes (store assigns request ids) ===

    async fn insert_request(&self, req: &NewRequest) -> Result<RequestId, TransferError>;

    // === Conditional updates (CAS) ===

    /// Write `update` only if the request's status still equals `expected`.
    async fn update_request_status_if(
        &self,
        id: RequestId,
        expected: RequestStatus,
        update: &StatusUpdate,
    ) -> Result<bool, TransferError>;

    /// Acquire the project lock only if no one holds it
    /// (`lock_owner IS NULL`).
    async fn lock_project_if_unlocked(
        &self,
        id: ProjectId,
        holder: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, TransferError>;

    /// Release the project lock only if someone holds it
    /// (`lock_owner IS NOT NULL`).
    async fn unlock_project_if_locked(&self, id: ProjectId) -> Result<bool, TransferError>;

    /// Move the contig only if it is still in `from` - the single-mover
    /// guard against concurrent executors.
    async fn move_contig_if_in(
        &self,
        contig_id: ContigId,
        from: ProjectId,
        to: ProjectId,
    ) -> Result<bool, TransferError>;
}
