//! Transfer Request Status Definitions
//!
//! Status IDs are designed for PostgreSQL storage as SMALLINT.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transfer request status
///
/// Terminal states: DONE (40), REFUSED (-10), CANCELLED (-20), FAILED (-30).
///
/// Declared edges:
///
/// ```text
/// PENDING → APPROVED | REFUSED | CANCELLED
/// APPROVED → DONE | CANCELLED
/// ```
///
/// FAILED is never a requested target; it is forced by the workflow when a
/// precondition (contig currency / contig location) no longer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(i16)]
pub enum RequestStatus {
    /// Initial state - request recorded, awaiting review
    Pending = 0,

    /// Reviewer accepted the move; awaiting execution
    Approved = 10,

    /// Terminal: contig moved to the destination project
    Done = 40,

    /// Terminal: reviewer rejected the move
    Refused = -10,

    /// Terminal: withdrawn by the requester (or an administrator)
    Cancelled = -20,

    /// Terminal: a precondition failed between transitions
    Failed = -30,
}

impl RequestStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Done
                | RequestStatus::Refused
                | RequestStatus::Cancelled
                | RequestStatus::Failed
        )
    }

    /// Check if the request still holds a claim on its contig
    /// (blocks competing requests on the same contig)
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Approved)
    }

    /// Check whether `next` is a declared edge from this state.
    ///
    /// FAILED is deliberately absent: it is reachable only through the
    /// workflow's forced transition, never as a requested edge.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (
                RequestStatus::Pending,
                RequestStatus::Approved | RequestStatus::Refused | RequestStatus::Cancelled
            ) | (
                RequestStatus::Approved,
                RequestStatus::Done | RequestStatus::Cancelled
            )
        )
    }

    /// Get the numeric status ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL status ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(RequestStatus::Pending),
            10 => Some(RequestStatus::Approved),
            40 => Some(RequestStatus::Done),
            -10 => Some(RequestStatus::Refused),
            -20 => Some(RequestStatus::Cancelled),
            -30 => Some(RequestStatus::Failed),
            _ => None,
        }
    }

    /// Get human-readable status name
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Done => "DONE",
            RequestStatus::Refused => "REFUSED",
            RequestStatus::Cancelled => "CANCELLED",
            RequestStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for RequestStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        RequestStatus::from_id(value).ok_or(())
    }
}
