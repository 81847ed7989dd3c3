//! JSON wire protocol between the remote repository client and the store
//! server.
//!
//! One request maps to one repository primitive. Requests are tagged by `op`,
//! replies by `status`. Model payloads keep their camelCase field names, so
//! `data` travels as a plain JSON object.

use crate::model::account::{Account, AccountData, AccountId, NewAccount};
use crate::model::project::{NewProject, Project, ProjectId};
use crate::model::ValidationError;
use crate::repo::vault_repo::AccountQuery;
use serde::{Deserialize, Serialize};

/// One repository primitive invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreRequest {
    ListProjects,
    GetProject {
        id: ProjectId,
    },
    InsertProject {
        project: NewProject,
    },
    DeleteProject {
        id: ProjectId,
    },
    GetAccount {
        id: AccountId,
    },
    InsertAccount {
        account: NewAccount,
    },
    UpdateAccountContent {
        id: AccountId,
        name: String,
        data: AccountData,
        updated_at: i64,
    },
    SetAccountDeletedAt {
        id: AccountId,
        deleted_at: Option<i64>,
    },
    DeleteAccount {
        id: AccountId,
    },
    ListAccounts {
        query: AccountQuery,
    },
    CountAccounts {
        query: AccountQuery,
    },
    UnlinkTrashedAccounts {
        project_id: ProjectId,
    },
    DeleteActiveAccounts {
        project_id: ProjectId,
    },
    DeleteTrashedAccounts,
}

impl StoreRequest {
    /// Stable operation name used in log events.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::ListProjects => "list_projects",
            Self::GetProject { .. } => "get_project",
            Self::InsertProject { .. } => "insert_project",
            Self::DeleteProject { .. } => "delete_project",
            Self::GetAccount { .. } => "get_account",
            Self::InsertAccount { .. } => "insert_account",
            Self::UpdateAccountContent { .. } => "update_account_content",
            Self::SetAccountDeletedAt { .. } => "set_account_deleted_at",
            Self::DeleteAccount { .. } => "delete_account",
            Self::ListAccounts { .. } => "list_accounts",
            Self::CountAccounts { .. } => "count_accounts",
            Self::UnlinkTrashedAccounts { .. } => "unlink_trashed_accounts",
            Self::DeleteActiveAccounts { .. } => "delete_active_accounts",
            Self::DeleteTrashedAccounts => "delete_trashed_accounts",
        }
    }
}

/// Server reply for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StoreReply {
    Projects { items: Vec<Project> },
    Project { item: Option<Project> },
    Account { item: Option<Account> },
    Accounts { items: Vec<Account> },
    Rows { affected: usize },
    Count { value: u64 },
    Error { error: WireError },
}

impl StoreReply {
    /// Reply variant name used in mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Projects { .. } => "projects",
            Self::Project { .. } => "project",
            Self::Account { .. } => "account",
            Self::Accounts { .. } => "accounts",
            Self::Rows { .. } => "rows",
            Self::Count { .. } => "count",
            Self::Error { .. } => "error",
        }
    }
}

/// Failure reported by the store server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum WireError {
    /// Request body could not be decoded.
    BadRequest { message: String },
    Validation { reason: ValidationError },
    /// An account write referenced a project that does not exist.
    MissingProject { project_id: ProjectId },
    /// Server-side data could not be decoded.
    InvalidData { message: String },
    /// Server-side storage failure.
    Storage { message: String },
}
