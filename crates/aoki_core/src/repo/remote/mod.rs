//! Remote networked implementation of the vault repository.
//!
//! # Responsibility
//! - Translate each repository primitive into one wire request.
//! - Map wire errors and transport failures back to `RepoError`.
//!
//! # Invariants
//! - One primitive call is exactly one round trip; nothing is batched, so
//!   multi-step protocols keep the ordering chosen by the caller.
//! - Writes validate input locally before sending.
//! - No retries: a failed round trip is reported unchanged.

pub mod server;
pub mod transport;
pub mod wire;

use crate::model::account::{
    validate_account_content, Account, AccountData, AccountId, NewAccount,
};
use crate::model::project::{NewProject, Project, ProjectId};
use crate::repo::vault_repo::{AccountQuery, RepoError, RepoResult, VaultRepository};
use log::warn;
use transport::RemoteTransport;
use wire::{StoreReply, StoreRequest, WireError};

/// Vault repository backed by a store server reached through a transport.
pub struct RemoteVaultRepository<T: RemoteTransport> {
    transport: T,
}

impl<T: RemoteTransport> RemoteVaultRepository<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn call(&self, request: StoreRequest) -> RepoResult<StoreReply> {
        let op = request.op_name();
        let body = serde_json::to_string(&request).map_err(|err| {
            RepoError::InvalidData(format!("failed to encode `{op}` request: {err}"))
        })?;

        let reply_body = self.transport.send(&body).map_err(|err| {
            warn!("event=store_call module=remote_repo status=error op={op} error={err}");
            RepoError::Transport(err)
        })?;

        match serde_json::from_str::<StoreReply>(&reply_body) {
            Ok(StoreReply::Error { error }) => Err(repo_error(error)),
            Ok(reply) => Ok(reply),
            Err(err) => Err(RepoError::InvalidData(format!(
                "undecodable `{op}` reply: {err}"
            ))),
        }
    }

    fn call_rows(&self, request: StoreRequest) -> RepoResult<usize> {
        match self.call(request)? {
            StoreReply::Rows { affected } => Ok(affected),
            other => Err(unexpected("rows", &other)),
        }
    }

    fn call_project(&self, request: StoreRequest) -> RepoResult<Option<Project>> {
        match self.call(request)? {
            StoreReply::Project { item } => Ok(item),
            other => Err(unexpected("project", &other)),
        }
    }

    fn call_account(&self, request: StoreRequest) -> RepoResult<Option<Account>> {
        match self.call(request)? {
            StoreReply::Account { item } => Ok(item),
            other => Err(unexpected("account", &other)),
        }
    }
}

impl<T: RemoteTransport> VaultRepository for RemoteVaultRepository<T> {
    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        match self.call(StoreRequest::ListProjects)? {
            StoreReply::Projects { items } => Ok(items),
            other => Err(unexpected("projects", &other)),
        }
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.call_project(StoreRequest::GetProject { id })
    }

    fn insert_project(&self, project: &NewProject) -> RepoResult<Project> {
        project.validate()?;
        self.call_project(StoreRequest::InsertProject {
            project: project.clone(),
        })?
        .ok_or_else(|| RepoError::InvalidData("insert_project reply carried no record".into()))
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<usize> {
        self.call_rows(StoreRequest::DeleteProject { id })
    }

    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        self.call_account(StoreRequest::GetAccount { id })
    }

    fn insert_account(&self, account: &NewAccount) -> RepoResult<Account> {
        account.validate()?;
        self.call_account(StoreRequest::InsertAccount {
            account: account.clone(),
        })?
        .ok_or_else(|| RepoError::InvalidData("insert_account reply carried no record".into()))
    }

    fn update_account_content(
        &self,
        id: AccountId,
        name: &str,
        data: &AccountData,
        updated_at: i64,
    ) -> RepoResult<usize> {
        validate_account_content(name, data)?;
        self.call_rows(StoreRequest::UpdateAccountContent {
            id,
            name: name.to_string(),
            data: data.clone(),
            updated_at,
        })
    }

    fn set_account_deleted_at(
        &self,
        id: AccountId,
        deleted_at: Option<i64>,
    ) -> RepoResult<usize> {
        self.call_rows(StoreRequest::SetAccountDeletedAt { id, deleted_at })
    }

    fn delete_account(&self, id: AccountId) -> RepoResult<usize> {
        self.call_rows(StoreRequest::DeleteAccount { id })
    }

    fn list_accounts(&self, query: &AccountQuery) -> RepoResult<Vec<Account>> {
        match self.call(StoreRequest::ListAccounts {
            query: query.clone(),
        })? {
            StoreReply::Accounts { items } => Ok(items),
            other => Err(unexpected("accounts", &other)),
        }
    }

    fn count_accounts(&self, query: &AccountQuery) -> RepoResult<u64> {
        match self.call(StoreRequest::CountAccounts {
            query: query.clone(),
        })? {
            StoreReply::Count { value } => Ok(value),
            other => Err(unexpected("count", &other)),
        }
    }

    fn unlink_trashed_accounts(&self, project_id: ProjectId) -> RepoResult<usize> {
        self.call_rows(StoreRequest::UnlinkTrashedAccounts { project_id })
    }

    fn delete_active_accounts(&self, project_id: ProjectId) -> RepoResult<usize> {
        self.call_rows(StoreRequest::DeleteActiveAccounts { project_id })
    }

    fn delete_trashed_accounts(&self) -> RepoResult<usize> {
        self.call_rows(StoreRequest::DeleteTrashedAccounts)
    }
}

fn repo_error(error: WireError) -> RepoError {
    match error {
        WireError::Validation { reason } => RepoError::Validation(reason),
        WireError::MissingProject { project_id } => RepoError::MissingProject(project_id),
        WireError::InvalidData { message } => RepoError::InvalidData(message),
        WireError::BadRequest { message } | WireError::Storage { message } => {
            RepoError::Remote(message)
        }
    }
}

fn unexpected(expected: &str, reply: &StoreReply) -> RepoError {
    RepoError::InvalidData(format!(
        "expected `{expected}` reply, got `{}`",
        reply.kind()
    ))
}
