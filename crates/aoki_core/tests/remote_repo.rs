use aoki_core::db::open_db_in_memory;
use aoki_core::{
    AccountData, AccountQuery, CascadeStep, ErrorKind, HttpTransport, LifecycleError,
    LifecycleService, LoopbackTransport, NewProject, ProjectId, RemoteTransport,
    RemoteVaultRepository, RepoError, SqliteVaultRepository, TransportError, VaultRepository,
};
use std::cell::Cell;
use std::time::Duration;

/// Wraps a transport and fails exactly one upcoming call.
struct FlakyTransport<T: RemoteTransport> {
    inner: T,
    calls: Cell<usize>,
    fail_at: Cell<Option<usize>>,
}

impl<T: RemoteTransport> FlakyTransport<T> {
    fn new(inner: T) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
            fail_at: Cell::new(None),
        }
    }

    /// `1` fails the very next call, `2` the one after, and so on.
    fn fail_nth_call_from_now(&self, nth: usize) {
        self.fail_at.set(Some(self.calls.get() + nth));
    }
}

impl<T: RemoteTransport> RemoteTransport for FlakyTransport<T> {
    fn send(&self, body: &str) -> Result<String, TransportError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if self.fail_at.get() == Some(call) {
            self.fail_at.set(None);
            return Err(TransportError::Unreachable("connection reset".to_string()));
        }
        self.inner.send(body)
    }
}

/// Answers every request with the same canned body.
struct CannedTransport(&'static str);

impl RemoteTransport for CannedTransport {
    fn send(&self, _body: &str) -> Result<String, TransportError> {
        Ok(self.0.to_string())
    }
}

/// Deletes a project on the server just before an account insert reaches it,
/// as a concurrent client would between the existence check and the insert.
struct VanishingProjectTransport<R: VaultRepository> {
    server: R,
    doomed: Cell<Option<ProjectId>>,
}

impl<R: VaultRepository> RemoteTransport for VanishingProjectTransport<R> {
    fn send(&self, body: &str) -> Result<String, TransportError> {
        if body.contains(r#""op":"insert_account""#) {
            if let Some(project_id) = self.doomed.take() {
                self.server.delete_project(project_id).unwrap();
            }
        }
        LoopbackTransport::new(&self.server).send(body)
    }
}

#[test]
fn project_deleted_before_insert_reports_project_not_found() {
    let conn = open_db_in_memory().unwrap();
    let server = SqliteVaultRepository::try_new(&conn).unwrap();
    let transport = VanishingProjectTransport {
        server: &server,
        doomed: Cell::new(None),
    };
    let service = LifecycleService::new(RemoteVaultRepository::new(&transport));

    let project = service.create_project("Work", None).unwrap();
    transport.doomed.set(Some(project.id));

    let err = service
        .create_account(project.id, "Email", AccountData::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, LifecycleError::ProjectNotFound(id) if id == project.id));
    assert_eq!(
        server
            .count_accounts(&AccountQuery {
                state: aoki_core::AccountStateFilter::Any,
                ..AccountQuery::default()
            })
            .unwrap(),
        0
    );
}

#[test]
fn interrupted_cascade_keeps_invariants_and_retry_completes() {
    let conn = open_db_in_memory().unwrap();
    let server = SqliteVaultRepository::try_new(&conn).unwrap();
    let transport = FlakyTransport::new(LoopbackTransport::new(server));
    let service = LifecycleService::new(RemoteVaultRepository::new(&transport));

    let project = service.create_project("Work", None).unwrap();
    let trashed = service
        .create_account(project.id, "old", AccountData::new())
        .unwrap();
    let active = service
        .create_account(project.id, "live", AccountData::new())
        .unwrap();
    service.soft_delete(trashed.id).unwrap();

    // Step 1 goes through, step 2 fails.
    transport.fail_nth_call_from_now(2);
    let err = service.delete_project(project.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    match err {
        LifecycleError::Cascade {
            project_id,
            step,
            source: RepoError::Transport(_),
        } => {
            assert_eq!(project_id, project.id);
            assert_eq!(step, CascadeStep::DeleteActive);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Active account still hangs off an existing project; trashed one is orphaned.
    assert!(service.get_project(project.id).unwrap().is_some());
    assert_eq!(service.list_active(project.id).unwrap()[0].id, active.id);
    let orphan = service.get_account(trashed.id).unwrap().unwrap();
    assert!(orphan.is_trashed());
    assert_eq!(orphan.project_id, None);

    let report = service.delete_project(project.id).unwrap();
    assert_eq!(report.unlinked, 0);
    assert_eq!(report.removed, 1);
    assert!(report.project_removed);
    assert!(service.get_account(active.id).unwrap().is_none());
    assert_eq!(service.list_trash().unwrap().len(), 1);
}

#[test]
fn failure_before_first_step_leaves_everything_untouched() {
    let conn = open_db_in_memory().unwrap();
    let server = SqliteVaultRepository::try_new(&conn).unwrap();
    let transport = FlakyTransport::new(LoopbackTransport::new(server));
    let service = LifecycleService::new(RemoteVaultRepository::new(&transport));

    let project = service.create_project("Work", None).unwrap();
    let trashed = service
        .create_account(project.id, "old", AccountData::new())
        .unwrap();
    service.soft_delete(trashed.id).unwrap();

    transport.fail_nth_call_from_now(1);
    let err = service.delete_project(project.id).unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Cascade {
            step: CascadeStep::UnlinkTrashed,
            ..
        }
    ));

    let untouched = service.get_account(trashed.id).unwrap().unwrap();
    assert_eq!(untouched.project_id, Some(project.id));
}

#[test]
fn remote_writes_land_in_server_store() {
    let conn = open_db_in_memory().unwrap();
    let client = RemoteVaultRepository::new(LoopbackTransport::new(
        SqliteVaultRepository::try_new(&conn).unwrap(),
    ));

    let project = client
        .insert_project(&NewProject::new("Shared", Some("team"), 5))
        .unwrap();

    let direct = SqliteVaultRepository::try_new(&conn).unwrap();
    let stored = direct.get_project(project.id).unwrap().unwrap();
    assert_eq!(stored, project);
    assert_eq!(stored.description.as_deref(), Some("team"));
    assert_eq!(direct.count_accounts(&AccountQuery::default()).unwrap(), 0);
}

#[test]
fn client_validates_before_sending() {
    let transport = FlakyTransport::new(CannedTransport("{}"));
    let client = RemoteVaultRepository::new(&transport);

    let err = client
        .insert_project(&NewProject::new("  ", None, 1))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(transport.calls.get(), 0);
}

#[test]
fn server_error_reply_maps_to_remote_error() {
    let client = RemoteVaultRepository::new(CannedTransport(
        r#"{"status":"error","error":{"code":"storage","message":"disk full"}}"#,
    ));

    let err = client.list_projects().unwrap_err();
    assert!(matches!(err, RepoError::Remote(ref message) if message == "disk full"));

    let service = LifecycleService::new(client);
    assert_eq!(
        service.get_projects().unwrap_err().kind(),
        ErrorKind::BackendUnavailable
    );
}

#[test]
fn mismatched_or_garbage_replies_are_invalid_data() {
    let mismatched = RemoteVaultRepository::new(CannedTransport(r#"{"status":"count","value":3}"#));
    assert!(matches!(
        mismatched.list_projects().unwrap_err(),
        RepoError::InvalidData(_)
    ));

    let garbage = RemoteVaultRepository::new(CannedTransport("<html>502</html>"));
    assert!(matches!(
        garbage.get_account(uuid::Uuid::new_v4()).unwrap_err(),
        RepoError::InvalidData(_)
    ));
}

#[test]
fn unreachable_http_server_is_backend_unavailable() {
    let transport = HttpTransport::new("http://127.0.0.1:9", Duration::from_millis(500));
    let service = LifecycleService::new(RemoteVaultRepository::new(transport));

    let err = service.create_project("Work", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    assert!(matches!(
        err,
        LifecycleError::Backend(RepoError::Transport(_))
    ));
}
