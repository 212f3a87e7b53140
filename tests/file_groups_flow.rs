//! Integration tests for the file group endpoint family using wiremock.
//!
//! - GET    /api/filegroup           — list_file_groups
//! - GET    /api/filegroup/{id}      — get_file_group (merged with
//!   GET /api/filegroupfile/{id})
//! - POST   /api/filegroup           — create_file_group
//! - PATCH  /api/filegroup/{id}      — update_file_group / deploy_changes
//! - DELETE /api/filegroupfile/{id}  — delete_file
//! - POST   /api/filegroupfile       — upload_file / upload_dir

use kbremote::client::KbClient;
use kbremote::error::KbError;
use kbremote::file_groups::{
    create_file_group, delete_file, deploy_changes, get_file_group, list_file_groups,
    update_file_group, upload_dir, upload_file, FileGroupUpdate,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_client(server: &MockServer) -> KbClient {
    KbClient::with_base_url("k", "s", &server.uri()).unwrap()
}

#[tokio::test]
async fn list_file_groups_maps_to_domain_objects() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/api/filegroup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"FileGroupID": 5, "Name": "Menus", "AwaitingDeployment": false},
            {"FileGroupID": 6, "Name": "Ads", "AwaitingDeployment": true}
        ])))
        .mount(&server)
        .await;

    let groups = list_file_groups(&client).await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].id, 5);
    assert_eq!(groups[0].name, "Menus");
    assert!(groups[1].awaiting_deployment);
}

#[tokio::test]
async fn get_file_group_merges_and_sorts_the_file_listing() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("GET"))
        .and(path("/api/filegroup/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "FileGroupID": 5,
            "Name": "Menus",
            "AwaitingDeployment": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    // Listing deliberately out of order to exercise the sort-by-path rule.
    Mock::given(method("GET"))
        .and(path("/api/filegroupfile/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Files": [
                {
                    "FileName": "b.html",
                    "FilePath": "localcontent/menus/b.html",
                    "IsFolder": false,
                    "Size": 20,
                    "LastModified": "2024-03-01 08:30:00"
                },
                {
                    "FileName": "a.html",
                    "FilePath": "localcontent/menus/a.html",
                    "IsFolder": false,
                    "Size": 10,
                    "LastModified": "2024-03-01 08:00:00"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = get_file_group(&client, 5).await.unwrap();
    assert_eq!(group.id, 5);
    assert_eq!(group.files.len(), 2);
    assert_eq!(
        group.files[0].path, "localcontent/menus/a.html",
        "files must be sorted by path"
    );
    assert_eq!(group.files[1].name, "b.html");
    assert_eq!(group.files[0].size, 10);
    assert!(group.files[0].mtime.is_some());
}

#[tokio::test]
async fn create_file_group_unwraps_the_nested_entity() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/filegroup"))
        .and(body_json(serde_json::json!({"name": "Menus"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "filegroup": {
                "FileGroupID": 9,
                "Name": "Menus",
                "AwaitingDeployment": false
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = create_file_group(&client, "Menus").await.unwrap();
    assert_eq!(group.id, 9);
    assert_eq!(group.name, "Menus");
}

#[tokio::test]
async fn update_file_group_returns_the_updated_flag() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("PATCH"))
        .and(path("/api/filegroup/5"))
        .and(body_json(serde_json::json!({"name": "Menus v2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Updated": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = FileGroupUpdate {
        name: Some("Menus v2".to_string()),
        ..Default::default()
    };
    assert!(update_file_group(&client, 5, &update).await.unwrap());
}

#[tokio::test]
async fn empty_file_group_update_is_a_caller_error() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    let err = update_file_group(&client, 5, &FileGroupUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, KbError::Caller(_)), "got: {err:?}");
}

#[tokio::test]
async fn deploy_changes_patches_the_flag() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("PATCH"))
        .and(path("/api/filegroup/5"))
        .and(body_json(serde_json::json!({"deploychanges": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Updated": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(deploy_changes(&client, 5).await.unwrap());
}

#[tokio::test]
async fn delete_file_sends_the_rooted_path_in_the_body() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("DELETE"))
        .and(path("/api/filegroupfile/5"))
        .and(body_json(serde_json::json!({
            "path": "localcontent/menus/a.html"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Deleted": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(delete_file(&client, 5, "menus/a.html", None).await.unwrap());
}

#[tokio::test]
async fn upload_file_posts_multipart_and_reads_the_flag() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    Mock::given(method("POST"))
        .and(path("/api/filegroupfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Uploaded": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("menu.html");
    std::fs::write(&local, b"<html></html>").unwrap();

    assert!(upload_file(&client, 5, &local, Some("menus"), None)
        .await
        .unwrap());
}

#[tokio::test]
async fn upload_dir_walks_the_tree_sequentially() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    // Three files across two directory levels: three uploads expected.
    Mock::given(method("POST"))
        .and(path("/api/filegroupfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Uploaded": true
        })))
        .expect(3)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("menus");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("a.html"), b"a").unwrap();
    std::fs::write(root.join("b.html"), b"b").unwrap();
    std::fs::create_dir(root.join("img")).unwrap();
    std::fs::write(root.join("img").join("logo.png"), b"png").unwrap();

    upload_dir(&client, 5, &root, None).await.unwrap();
}

#[tokio::test]
async fn upload_dir_stops_at_the_first_rejected_file() {
    let server = MockServer::start().await;
    let client = mock_client(&server);

    // The service answers 200 but declines the file; traversal must abort
    // after the first attempt.
    Mock::given(method("POST"))
        .and(path("/api/filegroupfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Uploaded": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("menus");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("a.html"), b"a").unwrap();
    std::fs::write(root.join("b.html"), b"b").unwrap();

    let err = upload_dir(&client, 5, &root, None).await.unwrap_err();
    match err {
        KbError::UploadRejected { path } => assert!(path.ends_with("a.html")),
        other => panic!("expected UploadRejected, got {other:?}"),
    }
}
