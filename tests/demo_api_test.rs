//! Socket-level tests of the demo users API served behind the capture layer.

mod support;

use std::sync::Arc;

use support::{start_recorder, wait_for_records, RecordingTransport};

#[tokio::test]
async fn test_users_crud_flow_over_http() {
    let recording = Arc::new(RecordingTransport::default());
    let (addr, _shutdown) = start_recorder(vec![recording.clone()]).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    // Create
    let created: serde_json::Value = client
        .post(format!("{base}/users"))
        .json(&serde_json::json!({ "name": "A", "email": "a@x.com" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_owned();

    // Read
    let fetched: serde_json::Value = client
        .get(format!("{base}/users/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    // List
    let listed: serde_json::Value = client
        .get(format!("{base}/users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Update
    let updated: serde_json::Value = client
        .put(format!("{base}/users/{id}"))
        .json(&serde_json::json!({ "name": "B", "email": "b@x.com" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["name"], "B");

    // Delete
    let response = client
        .delete(format!("{base}/users/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client.get(format!("{base}/users/{id}")).send().await.unwrap();
    assert_eq!(response.status(), 404);

    // Every one of the six requests above was captured.
    let records = wait_for_records(&recording, 6).await;
    assert_eq!(records.len(), 6);
}

#[tokio::test]
async fn test_error_responses_are_captured_too() {
    let recording = Arc::new(RecordingTransport::default());
    let (addr, _shutdown) = start_recorder(vec![recording.clone()]).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/users"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let records = wait_for_records(&recording, 1).await;
    assert_eq!(records[0].response.status_code, 400);
    assert_eq!(records[0].request.body.as_deref(), Some(b"{not json".as_ref()));
}
