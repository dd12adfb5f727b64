//! Transfer Request Workflow
//!
//! Orchestrates the request state machine: reloads fresh state from the
//! store, re-validates the contig's currency and location, consults the
//! authorization policy, then performs the transition as a single
//! conditional write. Execution additionally consults the lock protocol
//! and moves the contig with a compare-and-swap keyed on its recorded
//! source project.
//!
//! A precondition that broke between transitions (contig merged away or
//! moved by someone else) both forces the request to FAILED and raises the
//! precipitating error - silent retry into an inconsistent world is
//! exactly what this module guards against.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::core_types::{ContigId, ProjectId, RequestId};
use crate::store::CurationStore;

use super::error::TransferError;
use super::lock::LockProtocol;
use super::notify::{NotificationHub, TransferEvent};
use super::policy;
use super::status::RequestStatus;
use super::types::{Contig, ContigTransferRequest, NewRequest, Person, Project, StatusUpdate};

pub struct TransferWorkflow {
    store: Arc<dyn CurationStore>,
    locks: LockProtocol,
    hub: NotificationHub,
}

impl TransferWorkflow {
    pub fn new(store: Arc<dyn CurationStore>, hub: NotificationHub) -> Self {
        let locks = LockProtocol::new(store.clone());
        Self { store, locks, hub }
    }

    /// The lock protocol sharing this workflow's store.
    pub fn locks(&self) -> &LockProtocol {
        &self.locks
    }

    pub fn store(&self) -> &Arc<dyn CurationStore> {
        &self.store
    }

    // === Operations ===

    /// Open a new PENDING transfer request moving `contig_id` to
    /// `dest_project_id`.
    pub async fn create(
        &self,
        requester: &Person,
        contig_id: ContigId,
        dest_project_id: ProjectId,
        comment: Option<String>,
    ) -> Result<ContigTransferRequest, TransferError> {
        let contig = self
            .store
            .contig(contig_id)
            .await?
            .ok_or(TransferError::NoSuchContig(contig_id))?;
        if !contig.is_current {
            return Err(TransferError::ContigNotCurrent(contig_id));
        }

        if let Some(existing) = self.store.active_request_for_contig(contig_id).await? {
            return Err(TransferError::ContigAlreadyRequested(existing.id));
        }

        if contig.project_id == dest_project_id {
            return Err(TransferError::ContigAlreadyInDestination(dest_project_id));
        }

        let source = self.load_project(contig.project_id).await?;
        let dest = self.load_project(dest_project_id).await?;

        if !policy::can_create(requester, &source, &dest) {
            return Err(TransferError::NotAuthorised {
                user: requester.username.clone(),
                action: "request this contig transfer",
            });
        }

        let id = self
            .store
            .insert_request(&NewRequest {
                contig_id,
                old_project: contig.project_id,
                new_project: dest_project_id,
                requester: requester.username.clone(),
                requester_comment: comment,
                opened: Utc::now(),
            })
            .await?;

        let request = self
            .store
            .request(id)
            .await?
            .ok_or(TransferError::InsertFailed("transfer_requests"))?;

        info!(
            request_id = request.id,
            contig_id,
            from = request.old_project,
            to = request.new_project,
            requester = %requester.username,
            "Transfer request created"
        );
        // Prior status is unknown to any observer at creation
        self.notify(requester, request.clone(), None);

        Ok(request)
    }

    /// Drive a PENDING request to APPROVED/REFUSED/CANCELLED, or an
    /// APPROVED one to CANCELLED.
    pub async fn review(
        &self,
        request_id: RequestId,
        reviewer: &Person,
        new_status: RequestStatus,
        comment: Option<String>,
    ) -> Result<ContigTransferRequest, TransferError> {
        let request = self.load_request(request_id).await?;
        let observed = request.status;

        if observed.is_terminal() {
            return Err(TransferError::InvalidStatusChange {
                from: observed,
                to: new_status,
            });
        }

        // Preconditions 1-2: contig currency and location, checked before
        // anything else so a stale request fails rather than looking like
        // an authorization problem.
        self.check_contig(&request, reviewer).await?;

        // Precondition 3: the requested transition must be a declared
        // review edge. DONE is reachable only through execute().
        let reviewable = matches!(
            new_status,
            RequestStatus::Approved | RequestStatus::Refused | RequestStatus::Cancelled
        );
        if !reviewable || !observed.can_transition_to(new_status) {
            return Err(TransferError::InvalidStatusChange {
                from: observed,
                to: new_status,
            });
        }

        // Precondition 4: authorization.
        let source = self.load_project(request.old_project).await?;
        let dest = self.load_project(request.new_project).await?;
        let authorised = match new_status {
            RequestStatus::Cancelled => policy::can_cancel(reviewer, &request),
            _ => policy::can_review(reviewer, &request, &source, &dest),
        };
        if !authorised {
            return Err(TransferError::NotAuthorised {
                user: reviewer.username.clone(),
                action: match new_status {
                    RequestStatus::Cancelled => "cancel the transfer request",
                    _ => "review the transfer request",
                },
            });
        }

        let update =
            StatusUpdate::reviewed_by(&reviewer.username, comment, new_status, Utc::now());
        if !self
            .store
            .update_request_status_if(request_id, observed, &update)
            .await?
        {
            // Another reviewer transitioned first; never double-apply.
            return Err(TransferError::UpdateFailed("transfer request status"));
        }

        let updated = self.reload(request_id, &request, &update).await;
        info!(
            request_id,
            reviewer = %reviewer.username,
            previous = %observed,
            status = %new_status,
            "Transfer request reviewed"
        );
        self.notify(reviewer, updated.clone(), Some(observed));

        Ok(updated)
    }

    /// Execute an APPROVED request: verify locks, move the contig with a
    /// compare-and-swap on its source project, then mark DONE.
    pub async fn execute(
        &self,
        request_id: RequestId,
        executor: &Person,
    ) -> Result<ContigTransferRequest, TransferError> {
        let request = self.load_request(request_id).await?;
        let observed = request.status;

        if observed.is_terminal() {
            return Err(TransferError::InvalidStatusChange {
                from: observed,
                to: RequestStatus::Done,
            });
        }

        self.check_contig(&request, executor).await?;

        if !observed.can_transition_to(RequestStatus::Done) {
            return Err(TransferError::InvalidStatusChange {
                from: observed,
                to: RequestStatus::Done,
            });
        }

        let source = self.load_project(request.old_project).await?;
        let dest = self.load_project(request.new_project).await?;
        if !policy::can_execute(executor, &request, &source, &dest) {
            return Err(TransferError::NotAuthorised {
                user: executor.username.clone(),
                action: "execute the transfer request",
            });
        }

        // Both projects must be unlocked at execution time.
        for project_id in [request.old_project, request.new_project] {
            if !self.locks.is_unlocked(project_id).await? {
                return Err(TransferError::ProjectIsLocked(project_id));
            }
        }

        // The atomic move: keyed on (contig, old_project). Zero rows means
        // another mover won; the request stays APPROVED for manual
        // re-drive - no blind retry.
        if !self
            .store
            .move_contig_if_in(request.contig_id, request.old_project, request.new_project)
            .await?
        {
            warn!(
                request_id,
                contig_id = request.contig_id,
                "Contig move matched no rows; request stays APPROVED"
            );
            return Err(TransferError::UpdateFailed("contig move"));
        }

        let update = StatusUpdate::done(Utc::now());
        if !self
            .store
            .update_request_status_if(request_id, observed, &update)
            .await?
        {
            // The contig has moved but the request transitioned under us
            // (e.g. a concurrent cancel landed between our two writes).
            error!(
                request_id,
                contig_id = request.contig_id,
                "Contig moved but request status CAS matched no rows"
            );
            return Err(TransferError::UpdateFailed("transfer request status"));
        }

        let updated = self.reload(request_id, &request, &update).await;
        info!(
            request_id,
            contig_id = request.contig_id,
            from = request.old_project,
            to = request.new_project,
            executor = %executor.username,
            "Transfer request executed"
        );
        self.notify(executor, updated.clone(), Some(observed));

        Ok(updated)
    }

    /// Convenience wrapper: review to CANCELLED.
    pub async fn cancel(
        &self,
        request_id: RequestId,
        actor: &Person,
    ) -> Result<ContigTransferRequest, TransferError> {
        self.review(request_id, actor, RequestStatus::Cancelled, None)
            .await
    }

    // === Advisory checks ===
    //
    // These mirror the enforced policy exactly: they call the same
    // predicates on the same freshly loaded entities. A `true` here means
    // the corresponding operation will not raise USER_NOT_AUTHORISED.

    pub async fn can_approve(
        &self,
        request_id: RequestId,
        person: &Person,
    ) -> Result<bool, TransferError> {
        let (request, source, dest) = self.load_for_policy(request_id).await?;
        Ok(policy::can_review(person, &request, &source, &dest))
    }

    pub async fn can_refuse(
        &self,
        request_id: RequestId,
        person: &Person,
    ) -> Result<bool, TransferError> {
        // Approve and refuse share one predicate
        self.can_approve(request_id, person).await
    }

    pub async fn can_cancel(
        &self,
        request_id: RequestId,
        person: &Person,
    ) -> Result<bool, TransferError> {
        let request = self.load_request(request_id).await?;
        Ok(policy::can_cancel(person, &request))
    }

    pub async fn can_execute(
        &self,
        request_id: RequestId,
        person: &Person,
    ) -> Result<bool, TransferError> {
        let (request, source, dest) = self.load_for_policy(request_id).await?;
        Ok(policy::can_execute(person, &request, &source, &dest))
    }

    // === Internals ===

    async fn load_request(
        &self,
        id: RequestId,
    ) -> Result<ContigTransferRequest, TransferError> {
        self.store
            .request(id)
            .await?
            .ok_or(TransferError::NoSuchRequest(id))
    }

    async fn load_project(&self, id: ProjectId) -> Result<Project, TransferError> {
        self.store
            .project(id)
            .await?
            .ok_or(TransferError::NoSuchProject(id))
    }

    async fn load_for_policy(
        &self,
        request_id: RequestId,
    ) -> Result<(ContigTransferRequest, Project, Project), TransferError> {
        let request = self.load_request(request_id).await?;
        let source = self.load_project(request.old_project).await?;
        let dest = self.load_project(request.new_project).await?;
        Ok((request, source, dest))
    }

    /// Preconditions 1-2 of every transition: the contig must still be
    /// current and still live in the request's recorded source project.
    /// A violation forces the request to FAILED and raises the cause.
    async fn check_contig(
        &self,
        request: &ContigTransferRequest,
        actor: &Person,
    ) -> Result<Contig, TransferError> {
        let contig = self.store.contig(request.contig_id).await?;
        match contig {
            Some(c) if !c.is_current => Err(self
                .fail_request(request, actor, TransferError::ContigNotCurrent(c.id))
                .await),
            // Unresolvable contig: merged into another and gone from view
            None => Err(self
                .fail_request(
                    request,
                    actor,
                    TransferError::ContigNotCurrent(request.contig_id),
                )
                .await),
            Some(c) if c.project_id != request.old_project => Err(self
                .fail_request(request, actor, TransferError::ContigHasMoved(c.id))
                .await),
            Some(c) => Ok(c),
        }
    }

    /// Force-transition to FAILED after a broken precondition. The CAS is
    /// keyed on the status we observed; losing it means someone else
    /// already transitioned the request, and their outcome stands.
    async fn fail_request(
        &self,
        request: &ContigTransferRequest,
        actor: &Person,
        cause: TransferError,
    ) -> TransferError {
        let update = StatusUpdate::failed(Utc::now());
        match self
            .store
            .update_request_status_if(request.id, request.status, &update)
            .await
        {
            Ok(true) => {
                warn!(
                    request_id = request.id,
                    contig_id = request.contig_id,
                    cause = cause.code(),
                    "Precondition broke mid-transition; request marked FAILED"
                );
                let updated = self.reload(request.id, request, &update).await;
                self.notify(actor, updated, Some(request.status));
                cause
            }
            Ok(false) => {
                debug!(
                    request_id = request.id,
                    "Concurrent transition preempted the forced FAILED"
                );
                cause
            }
            // An infrastructure fault outranks the business outcome
            Err(e) => e,
        }
    }

    /// Fetch the post-transition row; fall back to patching the observed
    /// copy if the re-read races a concurrent reader failure.
    async fn reload(
        &self,
        id: RequestId,
        observed: &ContigTransferRequest,
        update: &StatusUpdate,
    ) -> ContigTransferRequest {
        if let Ok(Some(fresh)) = self.store.request(id).await {
            return fresh;
        }
        let mut patched = observed.clone();
        patched.status = update.new_status;
        patched.reviewer = update.reviewer.clone().or(patched.reviewer);
        patched.reviewer_comment = update.reviewer_comment.clone().or(patched.reviewer_comment);
        patched.reviewed = patched.reviewed.or(update.reviewed);
        patched.closed = patched.closed.or(update.closed);
        patched
    }

    fn notify(
        &self,
        actor: &Person,
        request: ContigTransferRequest,
        previous: Option<RequestStatus>,
    ) {
        self.hub.broadcast(&TransferEvent {
            actor: actor.username.clone(),
            request,
            previous,
        });
    }
}
