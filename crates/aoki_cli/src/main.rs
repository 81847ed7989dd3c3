//! CLI status probe for the vault core.
//!
//! # Responsibility
//! - Resolve configuration from the environment (and an optional `.env`).
//! - Construct exactly one backend, local or remote, and report a summary.
//!
//! # Invariants
//! - Output carries names, counts and timestamps only; `data` values are
//!   never printed.

use aoki_core::db::open_db;
use aoki_core::{
    core_version, init_logging_from_config, ping, DataMode, HttpTransport, LifecycleService,
    RemoteVaultRepository, SqliteVaultRepository, VaultConfig, VaultRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    // Why: a missing `.env` is the normal case outside development; real
    // environment variables still apply.
    dotenvy::dotenv().ok();

    let config = match VaultConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("aoki: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("aoki: {err}");
        return ExitCode::FAILURE;
    }

    println!("aoki_core ping={}", ping());
    println!("aoki_core version={}", core_version());

    match start(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("event=cli_run module=cli status=error error={message}");
            eprintln!("aoki: {message}");
            ExitCode::FAILURE
        }
    }
}

fn start(config: &VaultConfig) -> Result<(), String> {
    match config.data_mode {
        DataMode::Local => {
            println!("backend=local db={}", config.db_path.display());
            let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
            let repo = SqliteVaultRepository::try_new(&conn).map_err(|err| err.to_string())?;
            report(config, repo)
        }
        DataMode::Remote => {
            println!("backend=remote api={}", config.api_url);
            let transport = HttpTransport::new(&config.api_url, config.remote_timeout);
            report(config, RemoteVaultRepository::new(transport))
        }
    }
}

fn report<R: VaultRepository>(config: &VaultConfig, repo: R) -> Result<(), String> {
    let service = LifecycleService::new(repo).with_policy(config.state_policy);

    let projects = service.get_projects().map_err(|err| err.to_string())?;
    println!("projects={}", projects.len());
    for summary in &projects {
        println!(
            "  {} active={} created_at={}",
            summary.project.name, summary.active_account_count, summary.project.created_at
        );
    }

    let trash = service.list_trash().map_err(|err| err.to_string())?;
    println!("trash={}", trash.len());
    for entry in &trash {
        println!(
            "  {} project={} deleted_at={}",
            entry.account.name,
            entry.project_label(),
            entry.account.deleted_at.unwrap_or_default()
        );
    }
    Ok(())
}
