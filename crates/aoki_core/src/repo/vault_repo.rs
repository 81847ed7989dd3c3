//! Vault repository contract shared by every storage backend.
//!
//! # Responsibility
//! - Define the primitive project/account operations a backend must offer.
//! - Define the backend error type surfaced to services.
//!
//! # Invariants
//! - Primitives carry no lifecycle semantics; they are plain row reads and
//!   conditional writes. Soft-delete rules live in the service layer.
//! - Ids are assigned by the backend on insert and never reused.
//! - Write paths validate model input before touching storage.

use crate::db::DbError;
use crate::model::account::{Account, AccountData, AccountId, NewAccount};
use crate::model::project::{NewProject, Project, ProjectId};
use crate::model::ValidationError;
use crate::repo::remote::transport::TransportError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Backend error for vault persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    /// An account write referenced a project row that does not exist.
    MissingProject(ProjectId),
    Db(DbError),
    /// Stored or transported data could not be decoded.
    InvalidData(String),
    /// The remote store could not be reached.
    Transport(TransportError),
    /// The remote store reported a storage failure.
    Remote(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MissingProject(id) => write!(f, "referenced project does not exist: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid vault data: {message}"),
            Self::Transport(err) => write!(f, "{err}"),
            Self::Remote(message) => write!(f, "remote store failure: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::MissingProject(_) | Self::InvalidData(_) | Self::Remote(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<TransportError> for RepoError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

/// Soft-delete state filter for account queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStateFilter {
    /// `deleted_at IS NULL`.
    #[default]
    Active,
    /// `deleted_at IS NOT NULL`.
    Trashed,
    Any,
}

/// Sort order for account queries. Ties fall back to newest insert first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountOrder {
    #[default]
    CreatedDesc,
    DeletedDesc,
}

/// Query options for listing or counting accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuery {
    /// Restrict to one parent project. `None` means every project, including
    /// orphaned accounts.
    pub project_id: Option<ProjectId>,
    pub state: AccountStateFilter,
    pub order: AccountOrder,
}

impl AccountQuery {
    /// Active accounts of one project, newest `created_at` first.
    pub fn active_in(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            state: AccountStateFilter::Active,
            order: AccountOrder::CreatedDesc,
        }
    }

    /// Trashed accounts across all projects, newest `deleted_at` first.
    pub fn trash() -> Self {
        Self {
            project_id: None,
            state: AccountStateFilter::Trashed,
            order: AccountOrder::DeletedDesc,
        }
    }
}

/// Primitive storage capability over the project and account collections.
///
/// Mutating primitives return the number of rows they touched so callers can
/// distinguish "applied" from "nothing matched".
pub trait VaultRepository {
    /// Lists all projects, newest `created_at` first.
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn insert_project(&self, project: &NewProject) -> RepoResult<Project>;
    fn delete_project(&self, id: ProjectId) -> RepoResult<usize>;

    /// Gets one account regardless of soft-delete state.
    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>>;
    fn insert_account(&self, account: &NewAccount) -> RepoResult<Account>;
    /// Replaces `name`, `data` and `updated_at`. Leaves state and parent alone.
    fn update_account_content(
        &self,
        id: AccountId,
        name: &str,
        data: &AccountData,
        updated_at: i64,
    ) -> RepoResult<usize>;
    fn set_account_deleted_at(&self, id: AccountId, deleted_at: Option<i64>)
        -> RepoResult<usize>;
    fn delete_account(&self, id: AccountId) -> RepoResult<usize>;
    fn list_accounts(&self, query: &AccountQuery) -> RepoResult<Vec<Account>>;
    fn count_accounts(&self, query: &AccountQuery) -> RepoResult<u64>;

    /// Clears `project_id` on trashed accounts of one project.
    fn unlink_trashed_accounts(&self, project_id: ProjectId) -> RepoResult<usize>;
    /// Hard-deletes active accounts of one project.
    fn delete_active_accounts(&self, project_id: ProjectId) -> RepoResult<usize>;
    /// Hard-deletes every trashed account.
    fn delete_trashed_accounts(&self) -> RepoResult<usize>;
}

impl<R: VaultRepository + ?Sized> VaultRepository for &R {
    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        (**self).list_projects()
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        (**self).get_project(id)
    }

    fn insert_project(&self, project: &NewProject) -> RepoResult<Project> {
        (**self).insert_project(project)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<usize> {
        (**self).delete_project(id)
    }

    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        (**self).get_account(id)
    }

    fn insert_account(&self, account: &NewAccount) -> RepoResult<Account> {
        (**self).insert_account(account)
    }

    fn update_account_content(
        &self,
        id: AccountId,
        name: &str,
        data: &AccountData,
        updated_at: i64,
    ) -> RepoResult<usize> {
        (**self).update_account_content(id, name, data, updated_at)
    }

    fn set_account_deleted_at(
        &self,
        id: AccountId,
        deleted_at: Option<i64>,
    ) -> RepoResult<usize> {
        (**self).set_account_deleted_at(id, deleted_at)
    }

    fn delete_account(&self, id: AccountId) -> RepoResult<usize> {
        (**self).delete_account(id)
    }

    fn list_accounts(&self, query: &AccountQuery) -> RepoResult<Vec<Account>> {
        (**self).list_accounts(query)
    }

    fn count_accounts(&self, query: &AccountQuery) -> RepoResult<u64> {
        (**self).count_accounts(query)
    }

    fn unlink_trashed_accounts(&self, project_id: ProjectId) -> RepoResult<usize> {
        (**self).unlink_trashed_accounts(project_id)
    }

    fn delete_active_accounts(&self, project_id: ProjectId) -> RepoResult<usize> {
        (**self).delete_active_accounts(project_id)
    }

    fn delete_trashed_accounts(&self) -> RepoResult<usize> {
        (**self).delete_trashed_accounts()
    }
}
