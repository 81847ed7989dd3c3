//! Project delete cascade.
//!
//! # Invariants
//! - Steps run strictly in order: unlink trashed accounts, delete active
//!   accounts, delete the project row. Each step finishes against the
//!   repository before the next starts.
//! - A failure stops the cascade with no rollback. Every prefix of the step
//!   list leaves active accounts attached to an existing project and trashed
//!   accounts recoverable, so a retry completes the job.
//! - Deleting an absent project is a successful no-op.

use crate::model::project::ProjectId;
use crate::repo::vault_repo::{RepoResult, VaultRepository};
use crate::service::clock::Clock;
use crate::service::lifecycle_service::{LifecycleError, LifecycleResult, LifecycleService};
use log::{error, info};

/// One step of the project delete cascade, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    /// `project_id = NULL` on the project's trashed accounts.
    UnlinkTrashed,
    /// Hard delete of the project's active accounts.
    DeleteActive,
    /// Removal of the project row.
    DeleteProject,
}

impl CascadeStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnlinkTrashed => "unlink_trashed",
            Self::DeleteActive => "delete_active",
            Self::DeleteProject => "delete_project",
        }
    }
}

/// Outcome of a completed cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectCascadeReport {
    /// Trashed accounts whose project link was cleared.
    pub unlinked: usize,
    /// Active accounts hard-deleted with the project.
    pub removed: usize,
    /// `false` when the project row was already gone.
    pub project_removed: bool,
}

impl<R: VaultRepository, C: Clock> LifecycleService<R, C> {
    /// Deletes a project, orphaning its trashed accounts and removing its
    /// active ones.
    ///
    /// # Errors
    /// - `LifecycleError::Cascade` naming the step that failed. Earlier steps
    ///   stay applied; calling again is safe.
    pub fn delete_project(&self, project_id: ProjectId) -> LifecycleResult<ProjectCascadeReport> {
        info!("event=project_delete module=lifecycle status=start project_id={project_id}");

        // Why: unlinking before deleting means an interruption after any step
        // leaves trashed accounts recoverable and no active account pointing
        // at a missing project.
        let unlinked = self.run_step(project_id, CascadeStep::UnlinkTrashed, |repo| {
            repo.unlink_trashed_accounts(project_id)
        })?;
        let removed = self.run_step(project_id, CascadeStep::DeleteActive, |repo| {
            repo.delete_active_accounts(project_id)
        })?;
        let project_rows = self.run_step(project_id, CascadeStep::DeleteProject, |repo| {
            repo.delete_project(project_id)
        })?;

        let report = ProjectCascadeReport {
            unlinked,
            removed,
            project_removed: project_rows > 0,
        };
        info!(
            "event=project_delete module=lifecycle status=ok project_id={} unlinked={} removed={} project_removed={}",
            project_id, report.unlinked, report.removed, report.project_removed
        );
        Ok(report)
    }

    fn run_step(
        &self,
        project_id: ProjectId,
        step: CascadeStep,
        apply: impl FnOnce(&R) -> RepoResult<usize>,
    ) -> LifecycleResult<usize> {
        apply(&self.repo).map_err(|source| {
            error!(
                "event=project_delete module=lifecycle status=error project_id={} step={} error={}",
                project_id,
                step.as_str(),
                source
            );
            LifecycleError::Cascade {
                project_id,
                step,
                source,
            }
        })
    }
}
