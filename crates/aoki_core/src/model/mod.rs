//! Domain model for projects and their credential accounts.
//!
//! # Responsibility
//! - Define canonical records shared by repositories and services.
//! - Keep write-path validation next to the data it guards.
//!
//! # Invariants
//! - Every record is identified by a store-assigned, never-reused id.
//! - `Account::deleted_at` is the complete soft-delete state: `None` means
//!   active, `Some(_)` means trashed.
//! - Only a trashed account may have `project_id == None`.

pub mod account;
pub mod project;

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Write-path validation failure for model inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    /// Project `name` is empty after trimming.
    EmptyProjectName,
    /// Account `name` is empty after trimming.
    EmptyAccountName,
    /// Account `data` contains a blank key.
    EmptyFieldKey,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProjectName => write!(f, "project name is required"),
            Self::EmptyAccountName => write!(f, "account name is required"),
            Self::EmptyFieldKey => write!(f, "account data keys must not be blank"),
        }
    }
}

impl Error for ValidationError {}
