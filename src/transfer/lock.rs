//! Project Lock Protocol
//!
//! Owns a project's `(lock_owner, lock_date)` pair. Acquire and release
//! are single conditional updates whose affected-row count is the sole
//! success signal - there is no read-then-write window on the lock field
//! itself. No automatic retry, no expiry: a lock persists until explicit
//! release.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::core_types::ProjectId;
use crate::store::CurationStore;

use super::error::TransferError;
use super::policy;
use super::types::{Person, Project};

pub struct LockProtocol {
    store: Arc<dyn CurationStore>,
}

impl LockProtocol {
    pub fn new(store: Arc<dyn CurationStore>) -> Self {
        Self { store }
    }

    async fn load_project(&self, id: ProjectId) -> Result<Project, TransferError> {
        self.store
            .project(id)
            .await?
            .ok_or(TransferError::NoSuchProject(id))
    }

    /// Acquire the lock on `project_id` for `actor`.
    ///
    /// Fails with `PROJECT_ALREADY_LOCKED` when the conditional update
    /// matches no row (someone else holds it).
    pub async fn lock(
        &self,
        project_id: ProjectId,
        actor: &Person,
    ) -> Result<Project, TransferError> {
        let project = self.load_project(project_id).await?;
        if !policy::can_lock(actor, &project) {
            return Err(TransferError::NotAuthorised {
                user: actor.username.clone(),
                action: "lock the project",
            });
        }

        if !self
            .store
            .lock_project_if_unlocked(project_id, &actor.username, Utc::now())
            .await?
        {
            return Err(TransferError::ProjectAlreadyLocked(project_id));
        }

        info!(project_id, holder = %actor.username, "Project locked");
        self.load_project(project_id).await
    }

    /// Acquire the lock on behalf of the project's declared owner.
    ///
    /// Used by administrative tooling that prepares a project for its
    /// owner; fails on an unowned project.
    pub async fn lock_for_owner(
        &self,
        project_id: ProjectId,
        actor: &Person,
    ) -> Result<Project, TransferError> {
        let project = self.load_project(project_id).await?;
        let owner = project
            .owner
            .clone()
            .ok_or(TransferError::ProjectHasNoOwner(project_id))?;

        if !policy::is_full_privilege(actor) && actor.username != owner {
            return Err(TransferError::NotAuthorised {
                user: actor.username.clone(),
                action: "lock the project for its owner",
            });
        }

        if !self
            .store
            .lock_project_if_unlocked(project_id, &owner, Utc::now())
            .await?
        {
            return Err(TransferError::ProjectAlreadyLocked(project_id));
        }

        info!(project_id, holder = %owner, actor = %actor.username, "Project locked for owner");
        self.load_project(project_id).await
    }

    /// Release the lock on `project_id`.
    ///
    /// Only the holder (or full-privilege) may release; fails with
    /// `PROJECT_NOT_LOCKED` when the conditional update matches no row.
    pub async fn unlock(
        &self,
        project_id: ProjectId,
        actor: &Person,
    ) -> Result<Project, TransferError> {
        let project = self.load_project(project_id).await?;
        if !project.is_locked() {
            return Err(TransferError::ProjectNotLocked(project_id));
        }
        if !policy::can_unlock(actor, &project) {
            return Err(TransferError::NotAuthorised {
                user: actor.username.clone(),
                action: "unlock the project",
            });
        }

        if !self.store.unlock_project_if_locked(project_id).await? {
            return Err(TransferError::ProjectNotLocked(project_id));
        }

        info!(project_id, actor = %actor.username, "Project unlocked");
        self.load_project(project_id).await
    }

    /// Read-only gate used before executing a transfer.
    pub async fn is_unlocked(&self, project_id: ProjectId) -> Result<bool, TransferError> {
        Ok(!self.load_project(project_id).await?.is_locked())
    }
}
