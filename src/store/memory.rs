//! In-memory store
//!
//! Test double (and demo backend) for [`CurationStore`]. A single mutex
//! guards all tables, so every compare-and-swap observes and writes
//! atomically - the same contract PostgreSQL gives per row.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core_types::{ContigId, ProjectId, RequestId};
use crate::transfer::error::TransferError;
use crate::transfer::status::RequestStatus;
use crate::transfer::types::{
    Contig, ContigTransferRequest, NewRequest, Person, Project, StatusUpdate,
};

use super::CurationStore;

#[derive(Default)]
struct Inner {
    projects: HashMap<ProjectId, Project>,
    contigs: HashMap<ContigId, Contig>,
    people: HashMap<String, Person>,
    requests: HashMap<RequestId, ContigTransferRequest>,
    next_request_id: RequestId,
}

/// In-memory [`CurationStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    // === Seeding helpers ===

    pub fn add_project(&self, project: Project) {
        self.lock().projects.insert(project.id, project);
    }

    pub fn add_contig(&self, contig: Contig) {
        self.lock().contigs.insert(contig.id, contig);
    }

    pub fn add_person(&self, person: Person) {
        self.lock().people.insert(person.username.clone(), person);
    }

    /// Out-of-band contig move, bypassing the CAS - simulates the assembly
    /// pipeline or a competing process editing the store directly.
    pub fn relocate_contig(&self, contig_id: ContigId, to: ProjectId) {
        if let Some(c) = self.lock().contigs.get_mut(&contig_id) {
            c.project_id = to;
        }
    }

    /// Out-of-band currency change - simulates a merge/supersede in the
    /// assembly pipeline.
    pub fn retire_contig(&self, contig_id: ContigId) {
        if let Some(c) = self.lock().contigs.get_mut(&contig_id) {
            c.is_current = false;
        }
    }
}

#[async_trait]
impl CurationStore for MemoryStore {
    async fn project(&self, id: ProjectId) -> Result<Option<Project>, TransferError> {
        Ok(self.lock().projects.get(&id).cloned())
    }

    async fn contig(&self, id: ContigId) -> Result<Option<Contig>, TransferError> {
        Ok(self.lock().contigs.get(&id).copied())
    }

    async fn person(&self, username: &str) -> Result<Option<Person>, TransferError> {
        Ok(self.lock().people.get(username).cloned())
    }

    async fn request(
        &self,
        id: RequestId,
    ) -> Result<Option<ContigTransferRequest>, TransferError> {
        Ok(self.lock().requests.get(&id).cloned())
    }

    async fn active_request_for_contig(
        &self,
        contig_id: ContigId,
    ) -> Result<Option<ContigTransferRequest>, TransferError> {
        Ok(self
            .lock()
            .requests
            .values()
            .find(|r| r.contig_id == contig_id && r.status.is_active())
            .cloned())
    }

    async fn requests_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ContigTransferRequest>, TransferError> {
        let mut out: Vec<_> = self
            .lock()
            .requests
            .values()
            .filter(|r| r.old_project == project_id || r.new_project == project_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    async fn requests_for_user(
        &self,
        username: &str,
    ) -> Result<Vec<ContigTransferRequest>, TransferError> {
        let mut out: Vec<_> = self
            .lock()
            .requests
            .values()
            .filter(|r| r.requester == username)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    async fn insert_request(&self, req: &NewRequest) -> Result<RequestId, TransferError> {
        let mut inner = self.lock();
        inner.next_request_id += 1;
        let id = inner.next_request_id;
        inner.requests.insert(
            id,
            ContigTransferRequest {
                id,
                contig_id: req.contig_id,
                old_project: req.old_project,
                new_project: req.new_project,
                requester: req.requester.clone(),
                requester_comment: req.requester_comment.clone(),
                reviewer: None,
                reviewer_comment: None,
                status: RequestStatus::Pending,
                opened: req.opened,
                reviewed: None,
                closed: None,
            },
        );
        Ok(id)
    }

    async fn update_request_status_if(
        &self,
        id: RequestId,
        expected: RequestStatus,
        update: &StatusUpdate,
    ) -> Result<bool, TransferError> {
        let mut inner = self.lock();
        let Some(req) = inner.requests.get_mut(&id) else {
            return Ok(false);
        };
        if req.status != expected {
            return Ok(false);
        }
        req.status = update.new_status;
        if let Some(reviewer) = &update.reviewer {
            req.reviewer = Some(reviewer.clone());
        }
        if let Some(comment) = &update.reviewer_comment {
            req.reviewer_comment = Some(comment.clone());
        }
        if update.reviewed.is_some() && req.reviewed.is_none() {
            req.reviewed = update.reviewed;
        }
        if update.closed.is_some() && req.closed.is_none() {
            req.closed = update.closed;
        }
        Ok(true)
    }

    async fn lock_project_if_unlocked(
        &self,
        id: ProjectId,
        holder: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, TransferError> {
        let mut inner = self.lock();
        let Some(project) = inner.projects.get_mut(&id) else {
            return Ok(false);
        };
        if project.lock_owner.is_some() {
            return Ok(false);
        }
        project.lock_owner = Some(holder.to_string());
        project.lock_date = Some(at);
        Ok(true)
    }

    async fn unlock_project_if_locked(&self, id: ProjectId) -> Result<bool, TransferError> {
        let mut inner = self.lock();
        let Some(project) = inner.projects.get_mut(&id) else {
            return Ok(false);
        };
        if project.lock_owner.is_none() {
            return Ok(false);
        }
        project.lock_owner = None;
        project.lock_date = None;
        Ok(true)
    }

    async fn move_contig_if_in(
        &self,
        contig_id: ContigId,
        from: ProjectId,
        to: ProjectId,
    ) -> Result<bool, TransferError> {
        let mut inner = self.lock();
        let Some(contig) = inner.contigs.get_mut(&contig_id) else {
            return Ok(false);
        };
        if contig.project_id != from {
            return Ok(false);
        }
        contig.project_id = to;
        Ok(true)
    }
}
