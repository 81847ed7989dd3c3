//! Project domain model.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable project identifier, assigned by the store on insert.
pub type ProjectId = Uuid;

/// Named group of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    /// Unix epoch milliseconds. Set once at creation.
    pub created_at: i64,
}

/// Insert payload for a project. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
}

impl NewProject {
    /// Builds an insert payload with trimmed name and description.
    ///
    /// A blank description is normalized to `None`.
    pub fn new(name: &str, description: Option<&str>, created_at: i64) -> Self {
        Self {
            name: name.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            created_at,
        }
    }

    /// Checks write-path invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        Ok(())
    }
}

impl Project {
    /// Materializes a stored record from an insert payload and assigned id.
    pub fn from_new(id: ProjectId, new: &NewProject) -> Self {
        Self {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            created_at: new.created_at,
        }
    }
}
