use std::time::Duration;

use cloudfs_core::{
    DeleteOptions, Destination, Error, ExistsPolicy, Folder, Item, RestConfig, RestorePolicy,
    Session, VersionConflict,
};
use serde_json::json;
use wiremock::matchers::{
    body_string_contains, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> RestConfig {
    RestConfig {
        retry_delay_base: Duration::from_millis(1),
        ..RestConfig::default()
    }
}

async fn linked_session(server: &MockServer) -> Session {
    Mock::given(method("POST"))
        .and(path("/v2/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "test-token"})),
        )
        .mount(server)
        .await;
    let session =
        Session::with_config("client-id", "client-secret", &server.uri(), fast_config()).unwrap();
    session.authenticate("demo", "hunter2").await.unwrap();
    session
}

fn folder_json(id: &str, name: &str, version: u64) -> serde_json::Value {
    json!({"id": id, "type": "folder", "name": name, "version": version})
}

/// Mounts the root meta plus a two-level tree: /abc (docs) containing
/// /abc/kid (reports). Returns the child folder.
async fn child_folder(server: &MockServer, session: &Session) -> Folder {
    Mock::given(method("GET"))
        .and(path("/v2/folders/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"meta": {"id": "", "type": "root", "name": "root"}}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/folders/"))
        .and(query_param_is_missing("filter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"items": [folder_json("abc", "docs", 3)]}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/folders/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"items": [folder_json("kid", "reports", 3)]}
        })))
        .mount(server)
        .await;

    let root = session.filesystem().unwrap().root().await.unwrap();
    let docs = root
        .list()
        .await
        .unwrap()
        .into_iter()
        .find_map(Item::into_folder)
        .unwrap();
    docs.list()
        .await
        .unwrap()
        .into_iter()
        .find_map(Item::into_folder)
        .unwrap()
}

async fn trashed_child(server: &MockServer, session: &Session) -> Folder {
    let mut folder = child_folder(server, session).await;
    Mock::given(method("DELETE"))
        .and(path("/v2/folders/abc/kid"))
        .and(query_param("commit", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .mount(server)
        .await;
    assert!(folder.delete(DeleteOptions::default()).await.unwrap());
    folder
}

#[tokio::test]
async fn move_updates_the_item_in_place() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = child_folder(&server, &session).await;
    assert_eq!(folder.address(), "/abc/kid");

    Mock::given(method("POST"))
        .and(path("/v2/folders/abc/kid"))
        .and(query_param("operation", "move"))
        .and(body_string_contains("to=%2Fdest"))
        .and(body_string_contains("name=reports"))
        .and(body_string_contains("exists=rename"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"meta": folder_json("kid", "reports", 4)}
        })))
        .mount(&server)
        .await;

    folder
        .move_to("/dest", None, ExistsPolicy::Rename)
        .await
        .unwrap();
    assert_eq!(folder.address(), "/dest/kid");
    assert!(!folder.in_trash());
}

#[tokio::test]
async fn copy_returns_a_new_item_and_leaves_the_original() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let folder = child_folder(&server, &session).await;

    Mock::given(method("POST"))
        .and(path("/v2/folders/abc/kid"))
        .and(query_param("operation", "copy"))
        .and(body_string_contains("name=reports+copy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"meta": folder_json("xyz", "reports copy", 1)}
        })))
        .mount(&server)
        .await;

    let copy = folder
        .copy_to("/dest", Some("reports copy"), ExistsPolicy::Rename)
        .await
        .unwrap();
    assert_eq!(copy.address(), "/dest/xyz");
    assert_eq!(folder.address(), "/abc/kid");
}

#[tokio::test]
async fn save_writes_pending_changes_with_the_held_version() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = child_folder(&server, &session).await;
    folder.state_mut().set_name("renamed");

    Mock::given(method("POST"))
        .and(path("/v2/folders/abc/kid/meta"))
        .and(body_string_contains("name=renamed"))
        .and(body_string_contains("version=3"))
        .and(body_string_contains("version-conflict=fail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"meta": folder_json("kid", "renamed", 4)}
        })))
        .mount(&server)
        .await;

    folder.save(VersionConflict::Fail).await.unwrap();
    assert_eq!(folder.name(), "renamed");
    assert_eq!(folder.state().version(), 4);
    assert!(!folder.state().has_pending_changes());
    assert_eq!(folder.address(), "/abc/kid");
}

#[tokio::test]
async fn save_without_changes_skips_the_network() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = child_folder(&server, &session).await;

    // no meta mock mounted; a request would fail with 404
    folder.save(VersionConflict::Fail).await.unwrap();
}

#[tokio::test]
async fn refresh_discards_pending_changes() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = child_folder(&server, &session).await;
    folder.state_mut().set_name("scratch");

    Mock::given(method("GET"))
        .and(path("/v2/folders/abc/kid/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"meta": folder_json("kid", "reports", 5)}
        })))
        .mount(&server)
        .await;

    folder.refresh().await.unwrap();
    assert_eq!(folder.name(), "reports");
    assert_eq!(folder.state().version(), 5);
    assert!(!folder.state().has_pending_changes());
}

#[tokio::test]
async fn delete_moves_the_item_to_trash() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let folder = trashed_child(&server, &session).await;

    assert!(folder.in_trash());
    assert_eq!(folder.address(), "/kid");
    let original = folder
        .state()
        .application_data()
        .get("_original_path")
        .and_then(|v| v.as_str());
    assert_eq!(original, Some("/abc"));
}

#[tokio::test]
async fn failed_delete_reports_false_unless_raising() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = child_folder(&server, &session).await;

    Mock::given(method("DELETE"))
        .and(path("/v2/folders/abc/kid"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(!folder.delete(DeleteOptions::default()).await.unwrap());

    let options = DeleteOptions {
        raise_on_error: true,
        ..DeleteOptions::default()
    };
    assert!(folder.delete(options).await.is_err());
}

#[tokio::test]
async fn committed_delete_is_terminal() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = trashed_child(&server, &session).await;

    Mock::given(method("DELETE"))
        .and(path("/v2/trash/kid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let options = DeleteOptions {
        commit: true,
        ..DeleteOptions::default()
    };
    assert!(folder.delete(options).await.unwrap());
    assert!(!folder.state().exists());

    let err = folder.refresh().await.expect_err("item is gone");
    assert!(matches!(err, Error::InvalidItem));
}

#[tokio::test]
async fn trashed_delete_without_commit_is_a_noop() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = trashed_child(&server, &session).await;

    // no trash DELETE mock; a request would fail
    assert!(folder.delete(DeleteOptions::default()).await.unwrap());
    assert!(folder.in_trash());
    assert!(folder.state().exists());
}

#[tokio::test]
async fn restore_lands_at_the_original_location() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = trashed_child(&server, &session).await;

    Mock::given(method("POST"))
        .and(path("/v2/trash/kid"))
        .and(body_string_contains("restore=fail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/folders/abc/kid/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"meta": folder_json("kid", "reports", 3)}
        })))
        .mount(&server)
        .await;

    assert!(folder.restore(None, RestorePolicy::Fail, true).await.unwrap());
    assert!(!folder.in_trash());
    assert_eq!(folder.address(), "/abc/kid");
}

#[tokio::test]
async fn rescue_restore_falls_back_to_the_destination() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = trashed_child(&server, &session).await;

    Mock::given(method("POST"))
        .and(path("/v2/trash/kid"))
        .and(body_string_contains("restore=rescue"))
        .and(body_string_contains("rescue-path=%2Fsafe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .mount(&server)
        .await;
    // the original parent lookup is left unmocked and 404s
    Mock::given(method("GET"))
        .and(path("/v2/folders/safe/kid/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"meta": folder_json("kid", "reports", 3)}
        })))
        .mount(&server)
        .await;

    assert!(folder
        .restore(
            Some(Destination::Path("/safe")),
            RestorePolicy::Rescue,
            true
        )
        .await
        .unwrap());
    assert_eq!(folder.address(), "/safe/kid");
    assert!(!folder.in_trash());
}

#[tokio::test]
async fn recreate_restore_resolves_the_named_path() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = trashed_child(&server, &session).await;

    Mock::given(method("POST"))
        .and(path("/v2/trash/kid"))
        .and(body_string_contains("restore=recreate"))
        .and(body_string_contains("recreate-path=%2Farchive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/folders/"))
        .and(query_param("filter", "name=archive"))
        .and(query_param("strict-traverse", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"items": [folder_json("arch1", "archive", 1)]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/folders/arch1/kid/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"meta": folder_json("kid", "reports", 3)}
        })))
        .mount(&server)
        .await;

    assert!(folder
        .restore(
            Some(Destination::Path("/archive")),
            RestorePolicy::Recreate,
            true
        )
        .await
        .unwrap());
    assert_eq!(folder.address(), "/arch1/kid");
}

#[tokio::test]
async fn failing_restore_reports_false_when_not_raising() {
    let server = MockServer::start().await;
    let session = linked_session(&server).await;
    let mut folder = trashed_child(&server, &session).await;

    Mock::given(method("POST"))
        .and(path("/v2/trash/kid"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": 3001, "message": "not found"}
        })))
        .mount(&server)
        .await;

    assert!(!folder.restore(None, RestorePolicy::Fail, false).await.unwrap());
}
