//! Embedded SQLite implementation of the vault repository.
//!
//! # Responsibility
//! - Keep SQL details inside the local persistence boundary.
//! - Serialize `data` maps to a JSON text column and back.
//!
//! # Invariants
//! - Connections must be fully migrated before use (`try_new` checks).
//! - Read paths reject invalid persisted rows instead of masking them.
//! - `accounts.project_uuid` is a foreign key without ON DELETE action, so
//!   `delete_project` fails while any account still references the project.

use crate::db::ensure_migrated;
use crate::model::account::{
    validate_account_content, Account, AccountData, AccountId, NewAccount,
};
use crate::model::project::{NewProject, Project, ProjectId};
use crate::repo::vault_repo::{
    AccountOrder, AccountQuery, AccountStateFilter, RepoError, RepoResult, VaultRepository,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    description,
    created_at
FROM projects";

const ACCOUNT_SELECT_SQL: &str = "SELECT
    uuid,
    project_uuid,
    name,
    data,
    created_at,
    updated_at,
    deleted_at
FROM accounts";

/// SQLite-backed vault repository over a borrowed, migrated connection.
pub struct SqliteVaultRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVaultRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `RepoError::Db` when the schema version does not match this binary.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(conn)?;
        Ok(Self { conn })
    }

    /// Builds the `WHERE`/`ORDER BY` tail for an account query.
    fn account_filter_sql(query: &AccountQuery, with_order: bool) -> (String, Vec<Value>) {
        let mut sql = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(project_id) = query.project_id {
            sql.push_str(" AND project_uuid = ?");
            bind_values.push(Value::Text(project_id.to_string()));
        }

        match query.state {
            AccountStateFilter::Active => sql.push_str(" AND deleted_at IS NULL"),
            AccountStateFilter::Trashed => sql.push_str(" AND deleted_at IS NOT NULL"),
            AccountStateFilter::Any => {}
        }

        if with_order {
            match query.order {
                AccountOrder::CreatedDesc => sql.push_str(" ORDER BY created_at DESC, seq DESC"),
                AccountOrder::DeletedDesc => sql.push_str(" ORDER BY deleted_at DESC, seq DESC"),
            }
        }

        (sql, bind_values)
    }
}

impl VaultRepository for SqliteVaultRepository<'_> {
    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} ORDER BY created_at DESC, seq DESC;"))?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn insert_project(&self, project: &NewProject) -> RepoResult<Project> {
        project.validate()?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO projects (uuid, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                project.name.as_str(),
                project.description.as_deref(),
                project.created_at,
            ],
        )?;

        Ok(Project::from_new(id, project))
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM projects WHERE uuid = ?1;", [id.to_string()])?;
        Ok(removed)
    }

    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }
        Ok(None)
    }

    fn insert_account(&self, account: &NewAccount) -> RepoResult<Account> {
        account.validate()?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO accounts (
                uuid,
                project_uuid,
                name,
                data,
                created_at,
                updated_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, NULL);",
            params![
                id.to_string(),
                account.project_id.to_string(),
                account.name.as_str(),
                encode_data(&account.data)?,
                account.created_at,
            ],
        )
        .map_err(|err| insert_account_error(err, account.project_id))?;

        Ok(Account::from_new(id, account))
    }

    fn update_account_content(
        &self,
        id: AccountId,
        name: &str,
        data: &AccountData,
        updated_at: i64,
    ) -> RepoResult<usize> {
        validate_account_content(name, data)?;

        let changed = self.conn.execute(
            "UPDATE accounts
             SET
                name = ?2,
                data = ?3,
                updated_at = ?4
             WHERE uuid = ?1;",
            params![id.to_string(), name, encode_data(data)?, updated_at],
        )?;
        Ok(changed)
    }

    fn set_account_deleted_at(
        &self,
        id: AccountId,
        deleted_at: Option<i64>,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE accounts SET deleted_at = ?2 WHERE uuid = ?1;",
            params![id.to_string(), deleted_at],
        )?;
        Ok(changed)
    }

    fn delete_account(&self, id: AccountId) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM accounts WHERE uuid = ?1;", [id.to_string()])?;
        Ok(removed)
    }

    fn list_accounts(&self, query: &AccountQuery) -> RepoResult<Vec<Account>> {
        let (tail, bind_values) = Self::account_filter_sql(query, true);
        let mut stmt = self.conn.prepare(&format!("{ACCOUNT_SELECT_SQL}{tail};"))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut accounts = Vec::new();
        while let Some(row) = rows.next()? {
            accounts.push(parse_account_row(row)?);
        }
        Ok(accounts)
    }

    fn count_accounts(&self, query: &AccountQuery) -> RepoResult<u64> {
        let (tail, bind_values) = Self::account_filter_sql(query, false);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM accounts{tail};"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative account count `{count}`")))
    }

    fn unlink_trashed_accounts(&self, project_id: ProjectId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE accounts
             SET project_uuid = NULL
             WHERE project_uuid = ?1
               AND deleted_at IS NOT NULL;",
            [project_id.to_string()],
        )?;
        Ok(changed)
    }

    fn delete_active_accounts(&self, project_id: ProjectId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM accounts
             WHERE project_uuid = ?1
               AND deleted_at IS NULL;",
            [project_id.to_string()],
        )?;
        Ok(removed)
    }

    fn delete_trashed_accounts(&self) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM accounts WHERE deleted_at IS NOT NULL;", [])?;
        Ok(removed)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Project {
        id: parse_uuid(&uuid_text, "projects.uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let uuid_text: String = row.get("uuid")?;
    let project_id = match row.get::<_, Option<String>>("project_uuid")? {
        Some(value) => Some(parse_uuid(&value, "accounts.project_uuid")?),
        None => None,
    };
    let data_text: String = row.get("data")?;

    Ok(Account {
        id: parse_uuid(&uuid_text, "accounts.uuid")?,
        project_id,
        name: row.get("name")?,
        data: decode_data(&data_text)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

/// Reports a foreign key rejection on account insert as a missing project.
///
/// The project can vanish between a caller's existence check and the insert.
fn insert_account_error(err: rusqlite::Error, project_id: ProjectId) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
            return RepoError::MissingProject(project_id);
        }
    }
    err.into()
}

fn encode_data(data: &AccountData) -> RepoResult<String> {
    serde_json::to_string(data)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode account data: {err}")))
}

fn decode_data(text: &str) -> RepoResult<AccountData> {
    // Only the parse error kind is reported; the text holds credential values.
    serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid json object in accounts.data ({:?} at line {} column {})",
            err.classify(),
            err.line(),
            err.column()
        ))
    })
}
