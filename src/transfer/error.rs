//! Transfer Error Types
//!
//! Every expected, recoverable outcome of the workflow has its own variant
//! so a UI can render a specific, actionable message.
//!
//! `UpdateFailed` is strictly the "conditional write matched zero rows"
//! business outcome; storage connectivity faults are `Storage` and must
//! never be conflated with it.

use thiserror::Error;

use crate::core_types::{ContigId, ProjectId, RequestId};

use super::status::RequestStatus;

/// Transfer error taxonomy
///
/// Error codes are stable strings for API responses and UI dispatch.
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Resolution Errors ===
    #[error("No such user: {0}")]
    UnknownUser(String),

    #[error("No such contig: {0}")]
    NoSuchContig(ContigId),

    #[error("No such project: {0}")]
    NoSuchProject(ProjectId),

    #[error("No such transfer request: {0}")]
    NoSuchRequest(RequestId),

    // === Precondition Errors (force the request to FAILED) ===
    #[error("Contig {0} is no longer current (merged or superseded)")]
    ContigNotCurrent(ContigId),

    #[error("Contig {0} has moved out of the request's source project")]
    ContigHasMoved(ContigId),

    // === Validation Errors (state untouched) ===
    #[error("Contig already has an active transfer request: {0}")]
    ContigAlreadyRequested(RequestId),

    #[error("Contig is already in destination project {0}")]
    ContigAlreadyInDestination(ProjectId),

    #[error("User {user} is not authorised to {action}")]
    NotAuthorised { user: String, action: &'static str },

    #[error("Invalid status change: {from} -> {to}")]
    InvalidStatusChange {
        from: RequestStatus,
        to: RequestStatus,
    },

    // === Lock Errors ===
    #[error("Project {0} is locked")]
    ProjectIsLocked(ProjectId),

    #[error("Project {0} is already locked")]
    ProjectAlreadyLocked(ProjectId),

    #[error("Project {0} is not locked")]
    ProjectNotLocked(ProjectId),

    #[error("Project {0} has no owner to lock for")]
    ProjectHasNoOwner(ProjectId),

    // === Conditional Write Outcomes ===
    #[error("Insert affected no rows: {0}")]
    InsertFailed(&'static str),

    #[error("Conditional update matched no rows: {0}")]
    UpdateFailed(&'static str),

    // === Infrastructure (distinct class, never a business outcome) ===
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TransferError {
    /// Get the stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::UnknownUser(_) => "USER_IS_NULL",
            TransferError::NoSuchContig(_) => "NO_SUCH_CONTIG",
            TransferError::NoSuchProject(_) => "NO_SUCH_PROJECT",
            TransferError::NoSuchRequest(_) => "NO_SUCH_REQUEST",
            TransferError::ContigNotCurrent(_) => "CONTIG_NOT_CURRENT",
            TransferError::ContigHasMoved(_) => "CONTIG_HAS_MOVED",
            TransferError::ContigAlreadyRequested(_) => "CONTIG_ALREADY_REQUESTED",
            TransferError::ContigAlreadyInDestination(_) => {
                "CONTIG_ALREADY_IN_DESTINATION_PROJECT"
            }
            TransferError::NotAuthorised { .. } => "USER_NOT_AUTHORISED",
            TransferError::InvalidStatusChange { .. } => "INVALID_STATUS_CHANGE",
            TransferError::ProjectIsLocked(_) => "PROJECT_IS_LOCKED",
            TransferError::ProjectAlreadyLocked(_) => "PROJECT_ALREADY_LOCKED",
            TransferError::ProjectNotLocked(_) => "PROJECT_NOT_LOCKED",
            TransferError::ProjectHasNoOwner(_) => "PROJECT_HAS_NO_OWNER",
            TransferError::InsertFailed(_) => "SQL_INSERT_FAILED",
            TransferError::UpdateFailed(_) => "SQL_UPDATE_FAILED",
            TransferError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::UnknownUser(_) => 400,
            TransferError::NoSuchContig(_)
            | TransferError::NoSuchProject(_)
            | TransferError::NoSuchRequest(_) => 404,
            TransferError::NotAuthorised { .. } => 403,
            TransferError::ContigAlreadyInDestination(_) => 400,
            TransferError::ContigNotCurrent(_)
            | TransferError::ContigHasMoved(_)
            | TransferError::ContigAlreadyRequested(_)
            | TransferError::InvalidStatusChange { .. }
            | TransferError::ProjectAlreadyLocked(_)
            | TransferError::ProjectNotLocked(_)
            | TransferError::InsertFailed(_)
            | TransferError::UpdateFailed(_) => 409,
            TransferError::ProjectIsLocked(_) => 423,
            TransferError::ProjectHasNoOwner(_) => 422,
            TransferError::Storage(_) => 500,
        }
    }
}

impl From<sqlx::Error> for TransferError {
    fn from(e: sqlx::Error) -> Self {
        TransferError::Storage(e.to_string())
    }
}
