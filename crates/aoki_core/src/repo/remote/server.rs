//! Server-side dispatcher for the store wire protocol.
//!
//! # Responsibility
//! - Decode one request body, run the matching primitive on a repository and
//!   encode the reply.
//! - Convert repository failures into wire errors.
//!
//! An HTTP host mounts [`handle_json`] at `POST {base}/store`. The dispatcher
//! adds no lifecycle rules of its own.

use super::wire::{StoreReply, StoreRequest, WireError};
use crate::repo::vault_repo::{RepoError, RepoResult, VaultRepository};
use log::{debug, warn};

/// Decodes, executes and encodes one request. Never panics.
pub fn handle_json<R: VaultRepository + ?Sized>(repo: &R, body: &str) -> String {
    let reply = match serde_json::from_str::<StoreRequest>(body) {
        Ok(request) => handle_request(repo, request),
        Err(err) => {
            warn!("event=store_request module=remote_server status=error error_code=bad_request");
            StoreReply::Error {
                error: WireError::BadRequest {
                    message: format!("undecodable store request: {err}"),
                },
            }
        }
    };

    serde_json::to_string(&reply).unwrap_or_else(|err| {
        warn!("event=store_reply module=remote_server status=error error_code=encode_failed");
        format!(
            r#"{{"status":"error","error":{{"code":"storage","message":"failed to encode reply: {}"}}}}"#,
            err.to_string().replace('"', "'")
        )
    })
}

/// Executes one decoded request against the repository.
pub fn handle_request<R: VaultRepository + ?Sized>(repo: &R, request: StoreRequest) -> StoreReply {
    let op = request.op_name();
    match dispatch(repo, request) {
        Ok(reply) => {
            debug!("event=store_request module=remote_server status=ok op={op}");
            reply
        }
        Err(err) => {
            warn!("event=store_request module=remote_server status=error op={op} error={err}");
            StoreReply::Error {
                error: wire_error(err),
            }
        }
    }
}

fn dispatch<R: VaultRepository + ?Sized>(repo: &R, request: StoreRequest) -> RepoResult<StoreReply> {
    let reply = match request {
        StoreRequest::ListProjects => StoreReply::Projects {
            items: repo.list_projects()?,
        },
        StoreRequest::GetProject { id } => StoreReply::Project {
            item: repo.get_project(id)?,
        },
        StoreRequest::InsertProject { project } => StoreReply::Project {
            item: Some(repo.insert_project(&project)?),
        },
        StoreRequest::DeleteProject { id } => StoreReply::Rows {
            affected: repo.delete_project(id)?,
        },
        StoreRequest::GetAccount { id } => StoreReply::Account {
            item: repo.get_account(id)?,
        },
        StoreRequest::InsertAccount { account } => StoreReply::Account {
            item: Some(repo.insert_account(&account)?),
        },
        StoreRequest::UpdateAccountContent {
            id,
            name,
            data,
            updated_at,
        } => StoreReply::Rows {
            affected: repo.update_account_content(id, &name, &data, updated_at)?,
        },
        StoreRequest::SetAccountDeletedAt { id, deleted_at } => StoreReply::Rows {
            affected: repo.set_account_deleted_at(id, deleted_at)?,
        },
        StoreRequest::DeleteAccount { id } => StoreReply::Rows {
            affected: repo.delete_account(id)?,
        },
        StoreRequest::ListAccounts { query } => StoreReply::Accounts {
            items: repo.list_accounts(&query)?,
        },
        StoreRequest::CountAccounts { query } => StoreReply::Count {
            value: repo.count_accounts(&query)?,
        },
        StoreRequest::UnlinkTrashedAccounts { project_id } => StoreReply::Rows {
            affected: repo.unlink_trashed_accounts(project_id)?,
        },
        StoreRequest::DeleteActiveAccounts { project_id } => StoreReply::Rows {
            affected: repo.delete_active_accounts(project_id)?,
        },
        StoreRequest::DeleteTrashedAccounts => StoreReply::Rows {
            affected: repo.delete_trashed_accounts()?,
        },
    };
    Ok(reply)
}

fn wire_error(err: RepoError) -> WireError {
    match err {
        RepoError::Validation(reason) => WireError::Validation { reason },
        RepoError::MissingProject(project_id) => WireError::MissingProject { project_id },
        RepoError::InvalidData(message) => WireError::InvalidData { message },
        other => WireError::Storage {
            message: other.to_string(),
        },
    }
}
