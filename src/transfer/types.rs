//! Transfer Core Types
//!
//! Domain entities for the contig-transfer workflow: people and roles,
//! projects with their lock fields, contigs as seen from the assembly
//! subsystem, and the transfer request itself.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core_types::{ContigId, ProjectId, RequestId, Username};

use super::status::RequestStatus;

/// Role of a person in the curation directory
///
/// Stored as a free-form string; parsed case-insensitively. Team leaders,
/// administrators and superusers form the full-privilege group that
/// bypasses ordinary authorization (see `policy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    TeamLeader,
    Administrator,
    Superuser,
    Finisher,
    Annotator,
    Guest,
}

impl Role {
    /// Parse a role string case-insensitively; unknown roles become Guest.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "team leader" | "teamleader" => Role::TeamLeader,
            "administrator" | "admin" => Role::Administrator,
            "superuser" => Role::Superuser,
            "finisher" => Role::Finisher,
            "annotator" => Role::Annotator,
            _ => Role::Guest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::TeamLeader => "team leader",
            Role::Administrator => "administrator",
            Role::Superuser => "superuser",
            Role::Finisher => "finisher",
            Role::Annotator => "annotator",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A person known to the curation directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub username: Username,
    pub role: Role,
    /// Named privileges, e.g. `move_any_contig`
    pub privileges: HashSet<String>,
}

impl Person {
    pub fn new(username: impl Into<Username>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            privileges: HashSet::new(),
        }
    }

    pub fn with_privilege(mut self, privilege: impl Into<String>) -> Self {
        self.privileges.insert(privilege.into());
        self
    }

    pub fn has_privilege(&self, privilege: &str) -> bool {
        self.privileges.contains(privilege)
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.role)
    }
}

/// A curation project - a bucket of contigs owned by at most one curator
///
/// `lock_owner` and `lock_date` are both None or both Some; they are
/// mutated only through the lock protocol's conditional updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// None means unowned
    pub owner: Option<Username>,
    /// Relaxed-rule catch-all project
    pub is_bin: bool,
    pub lock_owner: Option<Username>,
    pub lock_date: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            is_bin: false,
            lock_owner: None,
            lock_date: None,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<Username>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn as_bin(mut self) -> Self {
        self.is_bin = true;
        self
    }

    #[inline]
    pub fn is_unowned(&self) -> bool {
        self.owner.is_none()
    }

    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner.as_deref() == Some(username)
    }

    /// Locked iff `lock_owner` is set
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lock_owner.is_some()
    }

    pub fn is_locked_by(&self, username: &str) -> bool {
        self.lock_owner.as_deref() == Some(username)
    }
}

/// A contig as consumed from the assembly subsystem
///
/// The workflow never mutates anything here except `project_id`, and that
/// only through the compare-and-swap move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    pub id: ContigId,
    pub project_id: ProjectId,
    /// False once merged into or superseded by another contig
    pub is_current: bool,
}

/// A contig transfer request - the workflow's unit of work
///
/// `old_project` is captured at creation and re-validated against the
/// contig's actual location at every later transition; a mismatch means a
/// competing request (or an out-of-band edit) moved the contig first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContigTransferRequest {
    pub id: RequestId,
    pub contig_id: ContigId,
    pub old_project: ProjectId,
    pub new_project: ProjectId,
    pub requester: Username,
    pub requester_comment: Option<String>,
    pub reviewer: Option<Username>,
    pub reviewer_comment: Option<String>,
    pub status: RequestStatus,
    pub opened: DateTime<Utc>,
    pub reviewed: Option<DateTime<Utc>>,
    pub closed: Option<DateTime<Utc>>,
}

impl ContigTransferRequest {
    /// Invariant check: `closed` is set iff the status is terminal
    pub fn is_consistent(&self) -> bool {
        self.closed.is_some() == self.status.is_terminal()
    }
}

impl fmt::Display for ContigTransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Request[{}] contig={} {} -> {} by {} status={}",
            self.id, self.contig_id, self.old_project, self.new_project, self.requester,
            self.status
        )
    }
}

/// Fields for inserting a new PENDING request; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub contig_id: ContigId,
    pub old_project: ProjectId,
    pub new_project: ProjectId,
    pub requester: Username,
    pub requester_comment: Option<String>,
    pub opened: DateTime<Utc>,
}

/// Fields written by a status CAS
///
/// Only `Some` fields are written; timestamps are set once and never
/// overwritten by later transitions.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub new_status: RequestStatus,
    pub reviewer: Option<Username>,
    pub reviewer_comment: Option<String>,
    pub reviewed: Option<DateTime<Utc>>,
    pub closed: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    /// Review transition: records the reviewer; closes negative terminals.
    pub fn reviewed_by(
        reviewer: &str,
        comment: Option<String>,
        new_status: RequestStatus,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            new_status,
            reviewer: Some(reviewer.to_string()),
            reviewer_comment: comment,
            reviewed: Some(at),
            closed: new_status.is_terminal().then_some(at),
        }
    }

    /// Forced transition to FAILED after a precondition broke mid-flight.
    pub fn failed(at: DateTime<Utc>) -> Self {
        Self {
            new_status: RequestStatus::Failed,
            reviewer: None,
            reviewer_comment: None,
            reviewed: None,
            closed: Some(at),
        }
    }

    /// Successful execution: APPROVED -> DONE.
    pub fn done(at: DateTime<Utc>) -> Self {
        Self {
            new_status: RequestStatus::Done,
            reviewer: None,
            reviewer_comment: None,
            reviewed: None,
            closed: Some(at),
        }
    }
}
