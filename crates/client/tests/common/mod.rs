//! Local stand-ins for the reporting API and the audit worker.
//!
//! Each server binds `127.0.0.1:0`, records every request it receives and
//! answers with canned JSON so the clients can be exercised end to end.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

/// One request as seen by a stub server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub route: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

/// Shared request log.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Recorded>>>);

impl Recorder {
    fn push(&self, route: impl Into<String>, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.0.lock().unwrap().push(Recorded {
            route: route.into(),
            authorization: header("authorization"),
            content_type: header("content-type"),
            body,
        });
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.0.lock().unwrap().clone()
    }
}

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Reporting API stub
// ---------------------------------------------------------------------------

pub fn sample_issues() -> Value {
    json!([
        {
            "code": "WCAG2AA.Principle1.Guideline1_1.1_1_1.H37",
            "context": "<img src=\"logo.png\">",
            "message": "Img element missing an alt attribute.",
            "selector": "html > body > img",
            "type": "error",
            "typeCode": 1
        },
        {
            "code": "WCAG2AA.Principle3.Guideline3_1.3_1_1.H57.2",
            "context": null,
            "message": "The html element should have a lang attribute.",
            "selector": "html",
            "type": "notice",
            "typeCode": 3
        }
    ])
}

/// Start a reporting API stub. Report creation assigns `_id = "r1"`.
pub async fn spawn_report_api() -> (String, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/api/reports", post(create_report).get(list_reports))
        .route("/api/reports/{id}", put(update_report).get(get_report))
        .route("/api/issues", post(create_issue).get(list_issues))
        .route("/api/urls", post(create_url).get(list_urls))
        .with_state(recorder.clone());
    (serve(router).await, recorder)
}

/// Start a stub that answers every request with `status`.
pub async fn spawn_failing(status: StatusCode) -> String {
    let router = Router::new().fallback(move || async move { (status, "upstream unavailable") });
    serve(router).await
}

async fn create_report(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.push("POST /api/reports", &headers, body.clone());
    let mut report = body;
    report["_id"] = json!("r1");
    (StatusCode::CREATED, Json(report))
}

async fn update_report(
    State(rec): State<Recorder>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.push(format!("PUT /api/reports/{id}"), &headers, body.clone());
    Json(body)
}

async fn get_report(
    State(rec): State<Recorder>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    rec.push(format!("GET /api/reports/{id}"), &headers, Value::Null);
    Json(json!({
        "_id": id,
        "rootUrl": "https://a.test/sitemap.xml",
        "standard": "WCAG2AA",
        "urls": ["https://a.test/"],
        "progress": 1.0,
        "codes": ["H37"]
    }))
}

async fn list_reports(
    State(rec): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    rec.push("GET /api/reports", &headers, json!(query));
    Json(json!([]))
}

async fn create_issue(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.push("POST /api/issues", &headers, body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn list_issues(
    State(rec): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    rec.push("GET /api/issues", &headers, json!(query));
    Json(sample_issues())
}

async fn create_url(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.push("POST /api/urls", &headers, body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn list_urls(
    State(rec): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    rec.push("GET /api/urls", &headers, json!(query));
    Json(json!([]))
}

// ---------------------------------------------------------------------------
// Worker and sitemap stubs
// ---------------------------------------------------------------------------

/// Start a worker stub returning [`sample_issues`] for every job.
pub async fn spawn_worker() -> (String, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/", post(run_job))
        .with_state(recorder.clone());
    (serve(router).await, recorder)
}

async fn run_job(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.push("POST /", &headers, body);
    Json(sample_issues())
}

/// Serve `document` at `/sitemap.xml`.
pub async fn spawn_sitemap(document: &'static str) -> String {
    let router = Router::new().route("/sitemap.xml", get(move || async move { document }));
    serve(router).await
}
