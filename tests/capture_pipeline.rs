//! End-to-end tests: real sockets, the demo API and the capture layer.

use std::collections::HashSet;
use std::time::Duration;

use axum::http::StatusCode;
use traffic_capture::CaptureOptions;

mod common;

const TEAL: &str = r#"{"Name":"teal","Red":0,"Green":128,"Blue":128}"#;

#[tokio::test]
async fn tracking_header_matches_entry() {
    let mut server = common::start_capture_server(CaptureOptions::default()).await;

    let response = common::client()
        .get(server.url("/api/colors"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tracking = response.headers()["http-tracking-id"]
        .to_str()
        .unwrap()
        .to_owned();
    let body = response.text().await.unwrap();

    let entry = server.next_entry().await;
    assert_eq!(entry.id.to_string(), tracking);
    assert_eq!(entry.method, "GET");
    assert_eq!(entry.uri.path(), "/api/colors");
    assert_eq!(entry.request_body, None);
    assert_eq!(entry.request_length, 0);
    assert_eq!(entry.status, StatusCode::OK);
    assert_eq!(entry.reason.as_deref(), Some("OK"));
    assert_eq!(entry.response_body.as_deref(), Some(body.as_str()));
    assert_eq!(entry.response_length, body.len() as u64);
    assert!(entry.completed);
    assert_eq!(
        entry.response_headers["http-tracking-id"].to_str().unwrap(),
        tracking
    );
}

#[tokio::test]
async fn post_bodies_are_captured_in_both_directions() {
    let mut server = common::start_capture_server(CaptureOptions::default()).await;
    let client = common::client();

    let response = client
        .post(server.url("/api/colors"))
        .header("content-type", "application/json; charset=utf-8")
        .body(TEAL)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["location"], "/api/color/teal");
    response.bytes().await.unwrap();

    let entry = server.next_entry().await;
    assert_eq!(entry.method, "POST");
    assert_eq!(entry.request_body.as_deref(), Some(TEAL));
    assert_eq!(entry.request_length, TEAL.len() as u64);
    assert_eq!(entry.status, StatusCode::CREATED);
    assert_eq!(entry.reason.as_deref(), Some("Created"));
    assert_eq!(entry.response_body.as_deref(), Some(TEAL));

    let response = client
        .post(server.url("/api/colors"))
        .header("content-type", "application/json")
        .body(TEAL)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    response.bytes().await.unwrap();

    let entry = server.next_entry().await;
    assert_eq!(entry.status, StatusCode::FOUND);
    assert_eq!(entry.reason.as_deref(), Some("Found"));
    assert_eq!(entry.response_length, 0);
    assert_eq!(entry.response_body, None);
}

#[tokio::test]
async fn response_preview_respects_budget() {
    let mut server = common::start_capture_server(CaptureOptions {
        max_response_body_bytes: Some(10),
        ..Default::default()
    })
    .await;

    let body = common::client()
        .get(server.url("/api/color?color=red"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let entry = server.next_entry().await;
    assert_eq!(entry.response_body.as_deref(), Some(&body[..10]));
    assert_eq!(entry.response_length, body.len() as u64);
}

#[tokio::test]
async fn custom_tracking_header_name() {
    let mut server = common::start_capture_server(CaptureOptions {
        tracking_header_name: Some("x-correlation-id".into()),
        ..Default::default()
    })
    .await;

    let response = common::client()
        .get(server.url("/api/color?color=mauve"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("http-tracking-id").is_none());
    let tracking = response.headers()["x-correlation-id"]
        .to_str()
        .unwrap()
        .to_owned();

    let entry = server.next_entry().await;
    assert_eq!(entry.id.to_string(), tracking);
    assert_eq!(entry.reason.as_deref(), Some("Not Found"));
}

#[tokio::test]
async fn concurrent_exchanges_get_unique_ids() {
    let mut server = common::start_capture_server(CaptureOptions::default()).await;
    let client = common::client();

    let requests = (0..20).map(|_| {
        let client = client.clone();
        let url = server.url("/api/colors");
        tokio::spawn(async move {
            let response = client.get(url).send().await.unwrap();
            let id = response.headers()["http-tracking-id"]
                .to_str()
                .unwrap()
                .to_owned();
            response.bytes().await.unwrap();
            id
        })
    });

    let mut header_ids = HashSet::new();
    for request in requests.collect::<Vec<_>>() {
        header_ids.insert(request.await.unwrap());
    }
    assert_eq!(header_ids.len(), 20);

    let mut entry_ids = HashSet::new();
    for _ in 0..20 {
        entry_ids.insert(server.next_entry().await.id.to_string());
    }
    assert_eq!(entry_ids, header_ids);
}

#[tokio::test]
async fn raw_request_body_is_counted_exactly() {
    let mut server = common::start_capture_server(CaptureOptions::default()).await;
    let body = r#"{"Name":"red","Red":1,"Green":2,"Blue":3}"#;
    let request = format!(
        "PUT /api/colors HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        server.addr,
        body.len(),
        body
    );

    let response = common::raw_request(server.addr, &request).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("http-tracking-id: "));

    let entry = server.next_entry().await;
    assert_eq!(entry.request_length, body.len() as u64);
    assert_eq!(entry.request_body.as_deref(), Some(body));
    assert_eq!(entry.response_body.as_deref(), Some(body));
}

#[tokio::test]
async fn shutdown_stops_server() {
    let server = common::start_capture_server(CaptureOptions::default()).await;

    server.shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}
