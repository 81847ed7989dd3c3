//! Per-project active account counts.
//!
//! Counts are derived on every read and never stored.

use crate::model::project::{Project, ProjectId};
use crate::repo::vault_repo::{AccountQuery, VaultRepository};
use crate::service::clock::Clock;
use crate::service::lifecycle_service::{LifecycleResult, LifecycleService};

/// Project list item with its live active-account count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub project: Project,
    pub active_account_count: u64,
}

impl<R: VaultRepository, C: Clock> LifecycleService<R, C> {
    /// Counts active accounts of one project. Trashed accounts never count.
    pub fn count_active(&self, project_id: ProjectId) -> LifecycleResult<u64> {
        Ok(self
            .repo
            .count_accounts(&AccountQuery::active_in(project_id))?)
    }

    /// Lists projects newest first, each with its active account count.
    pub fn get_projects(&self) -> LifecycleResult<Vec<ProjectSummary>> {
        self.repo
            .list_projects()?
            .into_iter()
            .map(|project| {
                let active_account_count = self.count_active(project.id)?;
                Ok(ProjectSummary {
                    project,
                    active_account_count,
                })
            })
            .collect()
    }
}
