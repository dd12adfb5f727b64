//! Concurrency guarantees of the curation store and workflow
//!
//! The store's conditional updates are the only concurrency primitive:
//! these tests drive them from many tasks at once (exactly-one-winner) and
//! through a delegating store that injects a competing write at the worst
//! possible moment (deterministic loser).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use contig_curator::core_types::{ContigId, ProjectId, RequestId};
use contig_curator::store::{CurationStore, MemoryStore};
use contig_curator::transfer::types::{
    Contig, ContigTransferRequest, NewRequest, Person, Project, StatusUpdate,
};
use contig_curator::transfer::{
    NotificationHub, RequestStatus, Role, TransferError, TransferWorkflow,
};

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.add_project(Project::new(1, "PKN01").with_owner("alice"));
    store.add_project(Project::new(2, "PKN02").with_owner("bob"));
    store.add_project(Project::new(3, "BIN").as_bin());
    store.add_contig(Contig {
        id: 7,
        project_id: 1,
        is_current: true,
    });
    store
}

async fn pending_request(store: &Arc<MemoryStore>) -> RequestId {
    store
        .insert_request(&NewRequest {
            contig_id: 7,
            old_project: 1,
            new_project: 3,
            requester: "alice".into(),
            requester_comment: None,
            opened: Utc::now(),
        })
        .await
        .unwrap()
}

// ============================================================================
// Exactly-One-Winner (store level)
// ============================================================================

#[tokio::test]
async fn concurrent_status_cas_has_one_winner() {
    let store = seeded_store();
    let id = pending_request(&store).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let update = StatusUpdate::reviewed_by(
                &format!("reviewer-{i}"),
                None,
                RequestStatus::Approved,
                Utc::now(),
            );
            store
                .update_request_status_if(id, RequestStatus::Pending, &update)
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "exactly one CAS keyed on PENDING may win");

    // The request carries exactly one reviewer, set by the winner
    let fresh = store.request(id).await.unwrap().unwrap();
    assert_eq!(fresh.status, RequestStatus::Approved);
    assert!(fresh.reviewer.is_some());
}

#[tokio::test]
async fn concurrent_lock_acquisition_has_one_winner() {
    let store = seeded_store();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .lock_project_if_unlocked(1, &format!("curator-{i}"), Utc::now())
                .await
                .unwrap()
        }));
    }

    let winners = {
        let mut n = 0;
        for handle in handles {
            if handle.await.unwrap() {
                n += 1;
            }
        }
        n
    };
    assert_eq!(winners, 1, "the project lock admits one holder");

    let project = store.project(1).await.unwrap().unwrap();
    assert!(project.is_locked());
    assert!(project.lock_date.is_some());
}

#[tokio::test]
async fn concurrent_movers_have_one_winner() {
    let store = seeded_store();

    let mut handles = Vec::new();
    for dest in [2, 3] {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.move_contig_if_in(7, 1, dest).await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "the move is keyed on the source project");

    let contig = store.contig(7).await.unwrap().unwrap();
    assert_ne!(contig.project_id, 1);
}

// ============================================================================
// Terminal States Are Monotonic
// ============================================================================

#[tokio::test]
async fn terminal_request_rejects_stale_cas() {
    let store = seeded_store();
    let id = pending_request(&store).await;

    let refuse = StatusUpdate::reviewed_by("alice", None, RequestStatus::Refused, Utc::now());
    assert!(
        store
            .update_request_status_if(id, RequestStatus::Pending, &refuse)
            .await
            .unwrap()
    );

    // Writers still keyed on PENDING all lose
    for target in [
        RequestStatus::Approved,
        RequestStatus::Cancelled,
        RequestStatus::Refused,
    ] {
        let stale = StatusUpdate::reviewed_by("bob", None, target, Utc::now());
        assert!(
            !store
                .update_request_status_if(id, RequestStatus::Pending, &stale)
                .await
                .unwrap()
        );
    }

    let fresh = store.request(id).await.unwrap().unwrap();
    assert_eq!(fresh.status, RequestStatus::Refused);
    assert_eq!(fresh.reviewer.as_deref(), Some("alice"));
}

// ============================================================================
// Deterministic Loser (workflow level)
// ============================================================================

/// Which conditional write the rival preempts.
#[derive(Clone, Copy, PartialEq)]
enum RaceOn {
    StatusCas,
    ContigMove,
}

/// Delegates everything to an inner store, but the first write of the
/// chosen kind is preceded by a rival's competing one - the caller
/// observed the old world, the rival lands first, the caller's CAS must
/// lose.
struct RacingStore {
    inner: Arc<MemoryStore>,
    race_on: RaceOn,
    raced: AtomicBool,
}

impl RacingStore {
    fn new(inner: Arc<MemoryStore>, race_on: RaceOn) -> Self {
        Self {
            inner,
            race_on,
            raced: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CurationStore for RacingStore {
    async fn project(&self, id: ProjectId) -> Result<Option<Project>, TransferError> {
        self.inner.project(id).await
    }

    async fn contig(&self, id: ContigId) -> Result<Option<Contig>, TransferError> {
        self.inner.contig(id).await
    }

    async fn person(&self, username: &str) -> Result<Option<Person>, TransferError> {
        self.inner.person(username).await
    }

    async fn request(
        &self,
        id: RequestId,
    ) -> Result<Option<ContigTransferRequest>, TransferError> {
        self.inner.request(id).await
    }

    async fn active_request_for_contig(
        &self,
        contig_id: ContigId,
    ) -> Result<Option<ContigTransferRequest>, TransferError> {
        self.inner.active_request_for_contig(contig_id).await
    }

    async fn requests_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ContigTransferRequest>, TransferError> {
        self.inner.requests_for_project(project_id).await
    }

    async fn requests_for_user(
        &self,
        username: &str,
    ) -> Result<Vec<ContigTransferRequest>, TransferError> {
        self.inner.requests_for_user(username).await
    }

    async fn insert_request(&self, req: &NewRequest) -> Result<RequestId, TransferError> {
        self.inner.insert_request(req).await
    }

    async fn update_request_status_if(
        &self,
        id: RequestId,
        expected: RequestStatus,
        update: &StatusUpdate,
    ) -> Result<bool, TransferError> {
        if self.race_on == RaceOn::StatusCas && !self.raced.swap(true, Ordering::SeqCst) {
            let rival =
                StatusUpdate::reviewed_by("rival", None, RequestStatus::Refused, Utc::now());
            self.inner
                .update_request_status_if(id, expected, &rival)
                .await?;
        }
        self.inner.update_request_status_if(id, expected, update).await
    }

    async fn lock_project_if_unlocked(
        &self,
        id: ProjectId,
        holder: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, TransferError> {
        self.inner.lock_project_if_unlocked(id, holder, at).await
    }

    async fn unlock_project_if_locked(&self, id: ProjectId) -> Result<bool, TransferError> {
        self.inner.unlock_project_if_locked(id).await
    }

    async fn move_contig_if_in(
        &self,
        contig_id: ContigId,
        from: ProjectId,
        to: ProjectId,
    ) -> Result<bool, TransferError> {
        if self.race_on == RaceOn::ContigMove && !self.raced.swap(true, Ordering::SeqCst) {
            // The rival drags the contig into project 2 first
            self.inner.move_contig_if_in(contig_id, from, 2).await?;
        }
        self.inner.move_contig_if_in(contig_id, from, to).await
    }
}

#[tokio::test]
async fn losing_reviewer_gets_update_failed_and_rival_outcome_stands() {
    let inner = seeded_store();
    inner.add_person(Person::new("alice", Role::Finisher));
    let store = Arc::new(RacingStore::new(inner.clone(), RaceOn::StatusCas));

    let workflow =
        TransferWorkflow::new(store as Arc<dyn CurationStore>, NotificationHub::new());
    let alice = Person::new("alice", Role::Finisher);

    let req = workflow.create(&alice, 7, 3, None).await.unwrap();

    // Alice observed PENDING; the rival's REFUSED lands just before her CAS
    let err = workflow
        .review(req.id, &alice, RequestStatus::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::UpdateFailed(_)));
    assert_eq!(err.code(), "SQL_UPDATE_FAILED");

    // The rival's outcome is untouched - never double-applied
    let fresh = inner.request(req.id).await.unwrap().unwrap();
    assert_eq!(fresh.status, RequestStatus::Refused);
    assert_eq!(fresh.reviewer.as_deref(), Some("rival"));
    assert!(fresh.closed.is_some());
}

#[tokio::test]
async fn losing_executor_keeps_request_approved() {
    let inner = seeded_store();
    let store = Arc::new(RacingStore::new(inner.clone(), RaceOn::ContigMove));

    let workflow =
        TransferWorkflow::new(store as Arc<dyn CurationStore>, NotificationHub::new());
    let alice = Person::new("alice", Role::Finisher);

    let req = workflow.create(&alice, 7, 3, None).await.unwrap();
    workflow
        .review(req.id, &alice, RequestStatus::Approved, None)
        .await
        .unwrap();

    // Alice re-validated the contig in project 1; the rival's move lands
    // just before her move CAS, which is keyed on the source project
    let err = workflow.execute(req.id, &alice).await.unwrap_err();
    assert!(matches!(err, TransferError::UpdateFailed(_)));
    assert_eq!(err.code(), "SQL_UPDATE_FAILED");

    // The request stays APPROVED for manual re-drive - no blind retry,
    // no forced FAILED
    let fresh = inner.request(req.id).await.unwrap().unwrap();
    assert_eq!(fresh.status, RequestStatus::Approved);
    assert!(fresh.closed.is_none());

    // The rival's move stands; the contig moved exactly once
    assert_eq!(inner.contig(7).await.unwrap().unwrap().project_id, 2);
}
