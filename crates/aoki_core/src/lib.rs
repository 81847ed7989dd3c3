//! Core domain logic for the Aoki credential vault.
//!
//! Owns the account soft-delete lifecycle and the project delete cascade,
//! written once against the `VaultRepository` capability and shipped with two
//! interchangeable backends: embedded SQLite and a remote store server.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DataMode, VaultConfig};
pub use logging::{
    default_log_level, init_logging_from_config, logging_status, LogTarget, LoggingError,
};
pub use model::account::{
    classify_field, Account, AccountData, AccountId, AccountState, FieldKind, NewAccount,
};
pub use model::project::{NewProject, Project, ProjectId};
pub use model::ValidationError;
pub use repo::remote::transport::{
    HttpTransport, LoopbackTransport, RemoteTransport, TransportError,
};
pub use repo::remote::RemoteVaultRepository;
pub use repo::sqlite_repo::SqliteVaultRepository;
pub use repo::vault_repo::{
    AccountOrder, AccountQuery, AccountStateFilter, RepoError, RepoResult, VaultRepository,
};
pub use service::aggregation::ProjectSummary;
pub use service::cascade::{CascadeStep, ProjectCascadeReport};
pub use service::clock::{Clock, SystemClock};
pub use service::filter::{AccountFilter, TrashFilter};
pub use service::lifecycle_service::{
    ErrorKind, LifecycleError, LifecycleResult, LifecycleService, StatePolicy, TrashEntry,
    UNKNOWN_PROJECT_LABEL,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
