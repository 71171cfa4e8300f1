//! End-to-end workflow tests with fake collaborators
//!
//! Each test serves a scripted backend or index on an ephemeral loopback
//! port and drives the console through its HTTP surface.

mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Scripted search index: two unsorted hits per name, 500 for names
/// containing "Bravo"
async fn fake_index_search(Json(body): Json<Value>) -> axum::response::Response {
    let name = body["query"]["multi_match"]["query"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    if name.contains("Bravo") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "index unavailable").into_response();
    }
    Json(json!({
        "took": 2,
        "hits": {
            "total": {"value": 2},
            "hits": [
                {"_score": 4.2, "_source": {"full_name": format!("{} (alias)", name), "source": "EU"}},
                {"_score": 9.1, "_source": {"full_name": name, "source": "OFAC"}}
            ]
        }
    }))
    .into_response()
}

/// Poll session status until it reaches a terminal state
async fn wait_for_terminal(app: &Router, session_id: &str) -> Value {
    for _ in 0..200 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/screening/status/{}", session_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let status = body_json(response).await;
        match status["state"].as_str().unwrap() {
            "COMPLETED" | "CANCELLED" | "FAILED" => return status,
            _ => tokio::time::sleep(Duration::from_millis(25)).await,
        }
    }
    panic!("screening session never reached a terminal state");
}

#[tokio::test]
async fn batch_screening_isolates_row_failures_and_keeps_input_order() {
    let index_url = support::spawn_server(
        Router::new().route("/sanctions/_search", post(fake_index_search)),
    )
    .await;
    let state = support::test_state_with(support::UNREACHABLE, &index_url).await;
    let app = screendesk_console::build_router(state);

    let csv = b"name,country\nAlice Alpha,GB\nBob Bravo,US\nCarol Charlie,FR\n";
    let (content_type, body) = support::multipart_body(&[("watchlist.csv", csv)]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/screening/start")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let started = body_json(response).await;
    assert_eq!(started["total_rows"], 3);
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let status = wait_for_terminal(&app, &session_id).await;
    assert_eq!(status["state"], "COMPLETED");
    assert_eq!(status["progress"]["current"], 3);
    assert!(status["ended_at"].is_string());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/screening/results/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let report = body_json(response).await;
    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    // Input order survives concurrent completion
    assert_eq!(results[0]["name"], "Alice Alpha");
    assert_eq!(results[1]["name"], "Bob Bravo");
    assert_eq!(results[2]["name"], "Carol Charlie");

    // Row 1 failed; its neighbors still carry full match lists
    assert!(results[1]["error"].is_string());
    assert!(results[1]["matches"].as_array().unwrap().is_empty());
    for i in [0, 2] {
        assert!(results[i]["error"].is_null(), "row {} errored", i);
        let matches = results[i]["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 2);
        // Sorted by descending score
        assert_eq!(matches[0]["score"], 9.1);
        assert_eq!(matches[1]["score"], 4.2);
    }
}

#[tokio::test]
async fn cancelling_a_finished_session_conflicts() {
    let index_url = support::spawn_server(
        Router::new().route("/sanctions/_search", post(fake_index_search)),
    )
    .await;
    let state = support::test_state_with(support::UNREACHABLE, &index_url).await;
    let app = screendesk_console::build_router(state);

    let (content_type, body) = support::multipart_body(&[("one.csv", b"name\nAlice Alpha\n")]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/screening/start")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let started = body_json(response).await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    wait_for_terminal(&app, &session_id).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/screening/cancel/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Scripted index that answers slowly, for cancellation-in-flight tests
async fn slow_index_search(Json(body): Json<Value>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    let name = body["query"]["multi_match"]["query"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "took": 500,
        "hits": {
            "total": {"value": 1},
            "hits": [{"_score": 5.0, "_source": {"full_name": name}}]
        }
    }))
}

#[tokio::test]
async fn cancelling_a_running_session_ends_it_cancelled() {
    let index_url = support::spawn_server(
        Router::new().route("/sanctions/_search", post(slow_index_search)),
    )
    .await;
    let state = support::test_state_with(support::UNREACHABLE, &index_url).await;
    let app = screendesk_console::build_router(state);

    let csv = b"name\nAlice Alpha\nBob Bravo\nCarol Charlie\nDan Delta\nEve Echo\nFay Foxtrot\n";
    let (content_type, body) = support::multipart_body(&[("watchlist.csv", csv)]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/screening/start")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let started = body_json(response).await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    // Cancel while queries are still in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/screening/cancel/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status = wait_for_terminal(&app, &session_id).await;
    assert_eq!(status["state"], "CANCELLED");
    assert!(status["ended_at"].is_string());

    // Unfinished rows are kept as error markers, none silently dropped
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/screening/results/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let report = body_json(response).await;
    assert_eq!(report["state"], "CANCELLED");
    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 6);
    assert!(results
        .iter()
        .any(|r| r["error"] == "screening cancelled"));
}

#[tokio::test]
async fn exhausted_deadline_with_nothing_screened_fails_the_session() {
    let state = support::test_state_configured(support::UNREACHABLE, support::UNREACHABLE, |c| {
        c.batch_deadline_secs = 0;
    })
    .await;
    let app = screendesk_console::build_router(state);

    let (content_type, body) =
        support::multipart_body(&[("watchlist.csv", b"name\nAlice Alpha\nBob Bravo\n")]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/screening/start")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let started = body_json(response).await;
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let status = wait_for_terminal(&app, &session_id).await;
    assert_eq!(status["state"], "FAILED");
    assert!(status["error"]
        .as_str()
        .unwrap()
        .contains("batch deadline exceeded"));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/screening/results/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let report = body_json(response).await;
    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result["error"], "batch deadline exceeded");
    }
}

#[tokio::test]
async fn search_auto_flags_above_threshold_exactly_once() {
    let backend_url = support::spawn_server(Router::new().route(
        "/api/search/search",
        post(|| async {
            Json(json!([
                {"fullName": "John Smith", "similarityPercentage": 95.0, "source": "OFAC"},
                {"fullName": "Jon Smyth", "similarityPercentage": 60.0, "source": "EU"}
            ]))
        }),
    ))
    .await;
    let state = support::test_state_with(&backend_url, support::UNREACHABLE).await;
    let app = screendesk_console::build_router(state);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/search", json!({"searchTerm": "John Smith"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["newly_flagged"].as_array().unwrap().len(), 1);
    let key = body["newly_flagged"][0].as_str().unwrap().to_string();

    // Same search again: same hit, no new flag
    let response = app
        .clone()
        .oneshot(json_request("POST", "/search", json!({"searchTerm": "John Smith"})))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["newly_flagged"].as_array().unwrap().is_empty());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/flags").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    let flagged = body["flagged"].as_array().unwrap();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0]["key"], key.as_str());
    assert_eq!(flagged[0]["hit"]["fullName"], "John Smith");

    // Both searches landed in history
    let response = app
        .oneshot(
            Request::builder()
                .uri("/reports/summary")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["total_searches"], 2);
    assert_eq!(summary["flagged_count"], 1);
    assert_eq!(summary["match_rate"], 100.0);
}

#[tokio::test]
async fn recent_imports_relay_backend_records() {
    let backend_url = support::spawn_server(Router::new().route(
        "/api/imports/recent",
        get(|| async {
            Json(json!([
                {"filename": "ofac.csv", "status": "completed", "entriesUpdated": 1200,
                 "createdAt": "2026-08-20T08:00:00Z", "fileSize": 51234}
            ]))
        }),
    ))
    .await;
    let state = support::test_state_with(&backend_url, support::UNREACHABLE).await;
    let app = screendesk_console::build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/imports/recent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let imports = body["imports"].as_array().unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0]["filename"], "ofac.csv");
    assert_eq!(imports[0]["entriesUpdated"], 1200);
}

#[tokio::test]
async fn audit_logs_refresh_cache_when_backend_answers() {
    let backend_url = support::spawn_server(Router::new().route(
        "/api/audit-logs",
        get(|| async {
            Json(json!([
                {"_id": "a1", "searchTerm": "John Smith", "searchType": "individual",
                 "userId": "analyst-7", "timestamp": "2026-08-01T12:00:00Z", "action": "search"}
            ]))
        }),
    ))
    .await;
    let state = support::test_state_with(&backend_url, support::UNREACHABLE).await;
    let app = screendesk_console::build_router(state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/audit-logs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["stale"], false);
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);

    // The fetched copy is now cached for later degraded serving
    let cached = screendesk_console::db::kv::cached_audit_logs(&state.db)
        .await
        .unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].search_term, "John Smith");
}
