//! HTTP surface tests driven through the full router.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_reports_components() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["store"]["kind"], "memory");
    assert_eq!(response.body["data"]["storage"]["healthy"], true);
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_resource_lifecycle() {
    let app = TestApp::new().await;
    let id = app.create_resource("Computer Organization").await;

    let response = app
        .request(
            "PUT",
            &format!("/api/resources/{id}"),
            Some(json!({ "tag": "Hot", "description": "Datapath labs" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["title"], "Computer Organization");
    assert_eq!(response.body["data"]["tag"], "Hot");

    let response = app.request("GET", "/api/resources/type/course", None).await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 1);

    let response = app
        .request("GET", "/api/resources/search?keyword=DATAPATH", None)
        .await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 1);

    let response = app
        .request("DELETE", &format!("/api/resources/{id}"), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert!(response.body["data"].is_null());

    let response = app.request("GET", &format!("/api/resources/{id}"), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_bad_input_maps_to_400() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/resources/not-a-uuid", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app.request("GET", "/api/resources/type/video", None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request("POST", "/api/resources", Some(json!({ "type": "course", "title": "" })))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_upload_tree_and_conflict() {
    let app = TestApp::new().await;
    let id = app.create_resource("Digital Logic").await;

    let response = app
        .request(
            "POST",
            &format!("/api/files/{id}/folders"),
            Some(json!({ "name": "labs" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let folder_id = response.body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(response.body["data"]["isFolder"], true);

    let response = app
        .upload(
            &format!("/api/files/{id}/upload?folderId={folder_id}"),
            &[("file", "lab1.pdf", b"%PDF-1.4".as_slice())],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"]["name"], "lab1.pdf");
    assert_eq!(response.body["data"]["type"], "pdf");
    assert_eq!(response.body["data"]["size"], "8B");

    let response = app
        .upload(
            &format!("/api/files/{id}/upload?folderId={folder_id}"),
            &[("file", "lab1.pdf", b"again".as_slice())],
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["success"], false);

    let response = app.request("GET", &format!("/api/files/{id}"), None).await;
    let tree = response.body["data"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["name"], "labs");
    assert_eq!(tree[0]["children"][0]["name"], "lab1.pdf");
}

#[tokio::test]
async fn test_batch_upload_and_reorder() {
    let app = TestApp::new().await;
    let id = app.create_resource("Circuits").await;

    let response = app
        .upload(
            &format!("/api/files/{id}/upload/batch"),
            &[
                ("files", "a.txt", b"a".as_slice()),
                ("files", "b.txt", b"b".as_slice()),
                ("files", "c.txt", b"c".as_slice()),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let items = response.body["data"].as_array().unwrap();
    let a = items[0]["id"].as_str().unwrap();
    let c = items[2]["id"].as_str().unwrap();

    let response = app
        .request(
            "POST",
            "/api/files/reorder",
            Some(json!({ "dragId": c, "dropId": a, "position": "before" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", &format!("/api/files/{id}"), None).await;
    let order: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["c.txt", "a.txt", "b.txt"]);

    let response = app
        .request(
            "POST",
            "/api/files/reorder",
            Some(json!({ "dragId": c, "dropId": a, "position": "sideways" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_and_delete_kinds() {
    let app = TestApp::new().await;
    let id = app.create_resource("Signals").await;

    let response = app
        .upload(&format!("/api/files/{id}/upload"), &[("file", "report.pdf", b"x".as_slice())])
        .await;
    let file_id = response.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{file_id}/rename"),
            Some(json!({ "newName": "summary.txt" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["name"], "summary.pdf");

    let response = app
        .request(
            "PUT",
            &format!("/api/files/{file_id}/rename"),
            Some(json!({ "newName": "   " })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request("DELETE", &format!("/api/files/folders/{file_id}"), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request("DELETE", &format!("/api/files/{file_id}"), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("DELETE", &format!("/api/files/{file_id}"), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_sets_attachment_header() {
    let app = TestApp::new().await;
    let id = app.create_resource("Architecture").await;

    let response = app
        .upload(
            &format!("/api/files/{id}/upload"),
            &[("file", "lab notes.pdf", b"%PDF-1.7 body".as_slice())],
        )
        .await;
    let url = response.body["data"]["url"]
        .as_str()
        .unwrap()
        .replace(' ', "%20");

    let response = app.request("GET", &url, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.raw[..], b"%PDF-1.7 body".as_slice());
    assert_eq!(response.headers["content-type"], "application/pdf");
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename*=UTF-8''lab%20notes.pdf"
    );

    let response = app
        .request("GET", &format!("/api/files/{id}/download/missing_file.pdf"), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let app = TestApp::with_config(|config| config.storage.max_upload_size_bytes = 1024).await;
    let id = app.create_resource("Big Files").await;

    let payload = vec![b'x'; 4096];
    let response = app
        .upload(&format!("/api/files/{id}/upload"), &[("file", "big.bin", payload.as_slice())])
        .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["success"], false);
    assert_eq!(
        response.body["message"],
        "File exceeds the maximum upload size"
    );
}

#[tokio::test]
async fn test_previews_disabled() {
    let app = TestApp::new().await;
    let id = app.create_resource("Logic").await;

    let response = app
        .upload(&format!("/api/files/{id}/upload"), &[("file", "adder.circ", b"<circuit/>".as_slice())])
        .await;
    assert!(response.body["data"]["previewUrl"].is_null());
    let file_id = response.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request("GET", &format!("/api/files/{file_id}/preview"), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .upload(&format!("/api/files/{id}/upload"), &[("file", "lab.doc", b"doc".as_slice())])
        .await;
    let doc_id = response.body["data"]["id"].as_str().unwrap().to_string();
    let response = app
        .request("GET", &format!("/api/files/{doc_id}/html"), None)
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_active_users_counts_forwarded_ips() {
    let app = TestApp::new().await;
    app.request("GET", "/api/health", None).await;
    app.request("GET", "/api/resources", None).await;

    let response = app.request("GET", "/api/metrics/active-users", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["activeUsers"], 1);
    assert_eq!(app.state.visitors.active_count(), 1);
}
