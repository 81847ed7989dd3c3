//! Account domain model.
//!
//! # Responsibility
//! - Define the credential record and its soft-delete state helpers.
//! - Normalize free-form `data` fields coming from form input.
//! - Classify field keys for display (secret/link/plain).
//!
//! # Invariants
//! - `deleted_at` is the single source of truth for active vs trashed.
//! - `project_id == None` only appears on accounts orphaned while trashed.
//! - `data` keys are non-blank; no key is structurally privileged.

use super::project::ProjectId;
use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable account identifier, assigned by the store on insert.
pub type AccountId = Uuid;

/// User-defined credential fields (`key -> value`).
pub type AccountData = BTreeMap<String, String>;

static SECRET_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)password|secret|token|^密码$").expect("valid secret key regex")
});
static LINK_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)url|link").expect("valid link key regex"));

/// Soft-delete state derived from `deleted_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    /// `deleted_at == None`.
    Active,
    /// `deleted_at != None`; recoverable through restore.
    Trashed,
}

/// Stored credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    /// Parent project. `None` only after the parent was deleted while trashed.
    pub project_id: Option<ProjectId>,
    pub name: String,
    pub data: AccountData,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Bumped by content updates only.
    pub updated_at: i64,
    /// Soft delete tombstone (epoch milliseconds).
    pub deleted_at: Option<i64>,
}

impl Account {
    /// Materializes a stored record from an insert payload and assigned id.
    pub fn from_new(id: AccountId, new: &NewAccount) -> Self {
        Self {
            id,
            project_id: Some(new.project_id),
            name: new.name.clone(),
            data: new.data.clone(),
            created_at: new.created_at,
            updated_at: new.created_at,
            deleted_at: None,
        }
    }

    pub fn state(&self) -> AccountState {
        if self.deleted_at.is_some() {
            AccountState::Trashed
        } else {
            AccountState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns whether the parent project link has been cleared.
    pub fn is_orphaned(&self) -> bool {
        self.project_id.is_none()
    }
}

/// Insert payload for an account. New accounts always start active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub project_id: ProjectId,
    pub name: String,
    pub data: AccountData,
    pub created_at: i64,
}

impl NewAccount {
    /// Builds an insert payload with trimmed name and normalized data.
    pub fn new(project_id: ProjectId, name: &str, data: AccountData, created_at: i64) -> Self {
        Self {
            project_id,
            name: name.trim().to_string(),
            data: normalize_account_data(data),
            created_at,
        }
    }

    /// Checks write-path invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_account_content(&self.name, &self.data)
    }
}

/// Validates account `name` and `data` for create/update writes.
pub fn validate_account_content(name: &str, data: &AccountData) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyAccountName);
    }
    if data.keys().any(|key| key.trim().is_empty()) {
        return Err(ValidationError::EmptyFieldKey);
    }
    Ok(())
}

/// Trims field keys and drops entries whose key is blank.
///
/// Values are kept verbatim. When two keys collide after trimming, the last
/// one in key order wins.
pub fn normalize_account_data(data: AccountData) -> AccountData {
    data.into_iter()
        .filter_map(|(key, value)| {
            let key = key.trim();
            if key.is_empty() {
                None
            } else {
                Some((key.to_string(), value))
            }
        })
        .collect()
}

/// Display category of one `data` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Masked by default (passwords, secrets, tokens).
    Secret,
    /// Rendered as an outbound link.
    Link,
    Plain,
}

/// Classifies a `data` field for presentation.
///
/// Display concern only: the store and lifecycle never treat secret keys
/// differently.
pub fn classify_field(key: &str, value: &str) -> FieldKind {
    if SECRET_KEY_RE.is_match(key) {
        FieldKind::Secret
    } else if LINK_KEY_RE.is_match(key) || value.starts_with("http") {
        FieldKind::Link
    } else {
        FieldKind::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::{
        classify_field, normalize_account_data, AccountData, AccountState, FieldKind, NewAccount,
    };
    use crate::model::account::Account;
    use crate::model::ValidationError;
    use uuid::Uuid;

    fn data(pairs: &[(&str, &str)]) -> AccountData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn normalize_trims_keys_and_drops_blank_ones() {
        let normalized = normalize_account_data(data(&[(" user ", "a"), ("  ", "dropped")]));
        assert_eq!(normalized, data(&[("user", "a")]));
    }

    #[test]
    fn new_account_starts_active_and_linked() {
        let project_id = Uuid::new_v4();
        let new = NewAccount::new(project_id, " Email ", data(&[("user", "a")]), 42);
        let account = Account::from_new(Uuid::new_v4(), &new);

        assert_eq!(account.name, "Email");
        assert_eq!(account.project_id, Some(project_id));
        assert_eq!(account.state(), AccountState::Active);
        assert_eq!(account.created_at, account.updated_at);
        assert!(!account.is_orphaned());
    }

    #[test]
    fn blank_account_name_fails_validation() {
        let new = NewAccount::new(Uuid::new_v4(), "   ", AccountData::new(), 1);
        assert_eq!(new.validate(), Err(ValidationError::EmptyAccountName));
    }

    #[test]
    fn classify_field_detects_secret_and_link_keys() {
        assert_eq!(classify_field("Password", "x"), FieldKind::Secret);
        assert_eq!(classify_field("api_token", "x"), FieldKind::Secret);
        assert_eq!(classify_field("密码", "x"), FieldKind::Secret);
        assert_eq!(classify_field("login url", "x"), FieldKind::Link);
        assert_eq!(classify_field("site", "https://example.com"), FieldKind::Link);
        assert_eq!(classify_field("user", "a@example.com"), FieldKind::Plain);
    }
}
