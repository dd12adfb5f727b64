//! Contig Transfer Workflow
//!
//! Moving a contig between curation projects happens only through a formal
//! transfer request driven by this module. The store's row-level atomicity
//! is the only concurrency primitive: every mutation is a conditional
//! update whose WHERE clause re-asserts the precondition the caller
//! observed.
//!
//! # State Machine
//!
//! ```text
//! PENDING → APPROVED → DONE
//!    ↓          ↓
//! REFUSED   CANCELLED      (FAILED: forced on a broken precondition)
//!    ↓
//! CANCELLED
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Reload-Before-Act**: every transition starts from freshly loaded
//!    state, then re-validates the contig's currency and location
//! 2. **CAS-Only Writes**: zero affected rows is a distinguished business
//!    outcome (`SQL_UPDATE_FAILED`), never silently retried
//! 3. **Single Mover**: the contig move is keyed on `(contig, old_project)`
//!    so exactly one of several competing executors wins
//! 4. **One Bypass Rule**: the full-privilege override lives in a single
//!    policy predicate shared by every authorization check

pub mod api;
pub mod error;
pub mod lock;
pub mod notify;
pub mod policy;
pub mod status;
pub mod types;
pub mod workflow;


// Re-exports for convenience
pub use error::TransferError;
pub use lock::LockProtocol;
pub use notify::{EventSink, LogSink, NotificationHub, TransferEvent};
pub use status::RequestStatus;
pub use types::{Contig, ContigTransferRequest, Person, Project, Role};
pub use workflow::TransferWorkflow;
