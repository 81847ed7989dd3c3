//! Account lifecycle use-case service.
//!
//! # Responsibility
//! - Own the soft-delete state machine: create, update, trash, restore and
//!   permanent delete of accounts.
//! - Join trashed accounts with their parent project names at read time.
//!
//! # Invariants
//! - Accounts are created active and always under an existing project.
//! - `restore` only clears `deleted_at`; a cleared `project_id` stays cleared.
//! - Content updates never touch `deleted_at` or `project_id`.
//! - The service holds no mutable state; every call runs to completion
//!   against the repository and nothing is retried internally.
//!
//! Under `StatePolicy::Strict`, trashing a trashed account and permanently
//! deleting an active account are rejected with `InvalidState`.

use crate::model::account::{
    normalize_account_data, validate_account_content, Account, AccountData, AccountId,
    AccountState, NewAccount,
};
use crate::model::project::{NewProject, Project, ProjectId};
use crate::model::ValidationError;
use crate::repo::vault_repo::{AccountQuery, RepoError, VaultRepository};
use crate::service::cascade::CascadeStep;
use crate::service::clock::{Clock, SystemClock};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Label shown for trashed accounts whose project no longer exists.
pub const UNKNOWN_PROJECT_LABEL: &str = "unknown project";

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Caller-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ValidationError,
    InvalidState,
    BackendUnavailable,
}

/// Lifecycle service error.
#[derive(Debug)]
pub enum LifecycleError {
    Validation(ValidationError),
    ProjectNotFound(ProjectId),
    AccountNotFound(AccountId),
    /// Operation is not allowed in the account's current state.
    InvalidState {
        account_id: AccountId,
        state: AccountState,
        operation: &'static str,
    },
    /// A project cascade stopped part-way. Steps before `step` were applied.
    Cascade {
        project_id: ProjectId,
        step: CascadeStep,
        source: RepoError,
    },
    Backend(RepoError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::ProjectNotFound(_) | Self::AccountNotFound(_) => ErrorKind::NotFound,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Cascade { .. } | Self::Backend(_) => ErrorKind::BackendUnavailable,
        }
    }
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::AccountNotFound(id) => write!(f, "account not found: {id}"),
            Self::InvalidState {
                account_id,
                state,
                operation,
            } => write!(
                f,
                "cannot {operation} account {account_id} while it is {}",
                match state {
                    AccountState::Active => "active",
                    AccountState::Trashed => "trashed",
                }
            ),
            Self::Cascade {
                project_id,
                step,
                source,
            } => write!(
                f,
                "project {project_id} delete stopped at step `{}`: {source}",
                step.as_str()
            ),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Cascade { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::ProjectNotFound(_) | Self::AccountNotFound(_) | Self::InvalidState { .. } => {
                None
            }
        }
    }
}

impl From<ValidationError> for LifecycleError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for LifecycleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::MissingProject(id) => Self::ProjectNotFound(id),
            other => Self::Backend(other),
        }
    }
}

/// How strictly state preconditions are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatePolicy {
    /// Reject trashing a trashed account and hard-deleting an active one.
    // Why: strict is the default so an irreversible delete can only reach
    // accounts that already went through the trash.
    #[default]
    Strict,
    /// Apply both unconditionally.
    Lenient,
}

/// Trashed account joined with its parent project name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashEntry {
    pub account: Account,
    /// `None` when the account is orphaned or the project vanished.
    pub project_name: Option<String>,
}

impl TrashEntry {
    /// Project name for display, falling back to [`UNKNOWN_PROJECT_LABEL`].
    pub fn project_label(&self) -> &str {
        self.project_name.as_deref().unwrap_or(UNKNOWN_PROJECT_LABEL)
    }
}

/// Lifecycle manager over one injected repository.
pub struct LifecycleService<R: VaultRepository, C: Clock = SystemClock> {
    pub(super) repo: R,
    pub(super) clock: C,
    policy: StatePolicy,
}

impl<R: VaultRepository> LifecycleService<R, SystemClock> {
    /// Creates a service using the wall clock and the strict policy.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: VaultRepository, C: Clock> LifecycleService<R, C> {
    /// Creates a service with a caller-provided time source.
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            policy: StatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> StatePolicy {
        self.policy
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates a project. Name is required; blank description is dropped.
    pub fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> LifecycleResult<Project> {
        let new = NewProject::new(name, description, self.clock.now_ms());
        new.validate()?;

        let project = self.repo.insert_project(&new)?;
        info!(
            "event=project_create module=lifecycle status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> LifecycleResult<Option<Project>> {
        Ok(self.repo.get_project(id)?)
    }

    /// Creates an active account under an existing project.
    ///
    /// # Errors
    /// - `Validation` for a blank name.
    /// - `ProjectNotFound` when `project_id` does not exist, including when the
    ///   project is deleted between the existence check and the insert.
    pub fn create_account(
        &self,
        project_id: ProjectId,
        name: &str,
        data: AccountData,
    ) -> LifecycleResult<Account> {
        let new = NewAccount::new(project_id, name, data, self.clock.now_ms());
        new.validate()?;

        // Why: checked up front so both backends report a missing project the
        // same way; a concurrent delete after this point still surfaces as
        // `ProjectNotFound` through `RepoError::MissingProject`.
        if self.repo.get_project(project_id)?.is_none() {
            return Err(LifecycleError::ProjectNotFound(project_id));
        }

        let account = self.repo.insert_account(&new)?;
        info!(
            "event=account_create module=lifecycle status=ok account_id={} project_id={} field_count={}",
            account.id,
            project_id,
            account.data.len()
        );
        Ok(account)
    }

    /// Gets one account in any state.
    pub fn get_account(&self, id: AccountId) -> LifecycleResult<Option<Account>> {
        Ok(self.repo.get_account(id)?)
    }

    /// Replaces `name` and `data` and bumps `updated_at`.
    ///
    /// Works the same for active and trashed accounts.
    pub fn update_account(
        &self,
        id: AccountId,
        name: &str,
        data: AccountData,
    ) -> LifecycleResult<Account> {
        let name = name.trim();
        let data = normalize_account_data(data);
        validate_account_content(name, &data)?;

        let changed = self
            .repo
            .update_account_content(id, name, &data, self.clock.now_ms())?;
        if changed == 0 {
            return Err(LifecycleError::AccountNotFound(id));
        }

        let account = self
            .repo
            .get_account(id)?
            .ok_or(LifecycleError::AccountNotFound(id))?;
        info!(
            "event=account_update module=lifecycle status=ok account_id={} field_count={}",
            id,
            account.data.len()
        );
        Ok(account)
    }

    /// Moves an active account to the trash (`deleted_at = now`).
    pub fn soft_delete(&self, id: AccountId) -> LifecycleResult<()> {
        let account = self.require_account(id)?;
        if account.is_trashed() && self.policy == StatePolicy::Strict {
            return Err(self.reject(&account, "trash"));
        }

        let changed = self
            .repo
            .set_account_deleted_at(id, Some(self.clock.now_ms()))?;
        if changed == 0 {
            return Err(LifecycleError::AccountNotFound(id));
        }
        info!("event=account_trash module=lifecycle status=ok account_id={id}");
        Ok(())
    }

    /// Clears `deleted_at`. Unconditional and idempotent; never re-links a
    /// cleared `project_id`.
    pub fn restore(&self, id: AccountId) -> LifecycleResult<()> {
        let changed = self.repo.set_account_deleted_at(id, None)?;
        if changed == 0 {
            return Err(LifecycleError::AccountNotFound(id));
        }
        info!("event=account_restore module=lifecycle status=ok account_id={id}");
        Ok(())
    }

    /// Hard-removes an account. Irreversible.
    pub fn permanently_delete(&self, id: AccountId) -> LifecycleResult<()> {
        if self.policy == StatePolicy::Strict {
            let account = self.require_account(id)?;
            if account.is_active() {
                return Err(self.reject(&account, "permanently delete"));
            }
        }

        let removed = self.repo.delete_account(id)?;
        if removed == 0 {
            return Err(LifecycleError::AccountNotFound(id));
        }
        info!("event=account_purge module=lifecycle status=ok account_id={id}");
        Ok(())
    }

    /// Active accounts of one project, newest `created_at` first.
    ///
    /// An unknown project yields an empty list.
    pub fn list_active(&self, project_id: ProjectId) -> LifecycleResult<Vec<Account>> {
        Ok(self.repo.list_accounts(&AccountQuery::active_in(project_id))?)
    }

    /// Trashed accounts across all projects, newest `deleted_at` first, each
    /// joined with its parent project name.
    pub fn list_trash(&self) -> LifecycleResult<Vec<TrashEntry>> {
        let accounts = self.repo.list_accounts(&AccountQuery::trash())?;
        let mut project_names: BTreeMap<ProjectId, Option<String>> = BTreeMap::new();
        let mut entries = Vec::with_capacity(accounts.len());

        for account in accounts {
            let project_name = match account.project_id {
                Some(project_id) => match project_names.get(&project_id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let name = self.repo.get_project(project_id)?.map(|p| p.name);
                        project_names.insert(project_id, name.clone());
                        name
                    }
                },
                None => None,
            };
            entries.push(TrashEntry {
                account,
                project_name,
            });
        }

        Ok(entries)
    }

    /// Permanently deletes every trashed account. Returns the removed count.
    pub fn empty_trash(&self) -> LifecycleResult<usize> {
        let removed = self.repo.delete_trashed_accounts()?;
        info!("event=trash_empty module=lifecycle status=ok removed={removed}");
        Ok(removed)
    }

    fn require_account(&self, id: AccountId) -> LifecycleResult<Account> {
        self.repo
            .get_account(id)?
            .ok_or(LifecycleError::AccountNotFound(id))
    }

    fn reject(&self, account: &Account, operation: &'static str) -> LifecycleError {
        warn!(
            "event=account_state_check module=lifecycle status=error account_id={} operation={}",
            account.id,
            operation.replace(' ', "_")
        );
        LifecycleError::InvalidState {
            account_id: account.id,
            state: account.state(),
            operation,
        }
    }
}
