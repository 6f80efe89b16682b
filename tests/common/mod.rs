//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use dns_failover::config::MonitorConfig;
use dns_failover::engine::EventSink;
use dns_failover::health::{EndpointRole, ProbeSpec, Prober};

/// Prober answering from per-target scripts, then per-target defaults,
/// then a global fallback.
pub struct ScriptedProber {
    scripts: Mutex<HashMap<String, VecDeque<bool>>>,
    defaults: Mutex<HashMap<String, bool>>,
    calls: Mutex<HashMap<String, usize>>,
    fallback: bool,
}

impl ScriptedProber {
    pub fn new(fallback: bool) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            defaults: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            fallback,
        })
    }

    /// Queue results for `target`, consumed one per probe.
    pub fn script(&self, target: &str, results: &[bool]) {
        self.scripts
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .extend(results.iter().copied());
    }

    /// Result for `target` once its script is exhausted.
    pub fn always(&self, target: &str, result: bool) {
        self.defaults.lock().unwrap().insert(target.to_string(), result);
    }

    pub fn calls(&self, target: &str) -> usize {
        self.calls.lock().unwrap().get(target).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, spec: &ProbeSpec) -> bool {
        let target = spec.target().to_string();
        *self.calls.lock().unwrap().entry(target.clone()).or_default() += 1;

        if let Some(next) = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&target)
            .and_then(VecDeque::pop_front)
        {
            return next;
        }
        self.defaults
            .lock()
            .unwrap()
            .get(&target)
            .copied()
            .unwrap_or(self.fallback)
    }
}

/// What a `RecordingSink` saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Switch { id: String, to_backup: bool },
    Scheduled { id: String, from: String, to: String },
    IpDown { id: String, ip: String, role: EndpointRole },
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn on_switch(&self, monitor: &MonitorConfig, to_backup: bool) {
        self.events.lock().unwrap().push(Recorded::Switch {
            id: monitor.id.clone(),
            to_backup,
        });
    }

    async fn on_scheduled_switch(&self, monitor: &MonitorConfig, from_ip: &str, to_ip: &str) {
        self.events.lock().unwrap().push(Recorded::Scheduled {
            id: monitor.id.clone(),
            from: from_ip.to_string(),
            to: to_ip.to_string(),
        });
    }

    async fn on_ip_down(&self, monitor: &MonitorConfig, ip: &str, role: EndpointRole) {
        self.events.lock().unwrap().push(Recorded::IpDown {
            id: monitor.id.clone(),
            ip: ip.to_string(),
            role,
        });
    }
}

pub const PRIMARY: &str = "192.0.2.10";
pub const BACKUP: &str = "192.0.2.20";

/// Ping monitor on PRIMARY/BACKUP with 60 s interval.
pub fn ping_monitor(id: &str, failure_threshold: u32, success_threshold: u32) -> MonitorConfig {
    MonitorConfig {
        id: id.to_string(),
        name: id.to_string(),
        check_type: "ping".to_string(),
        original_ip: PRIMARY.to_string(),
        backup_ip: BACKUP.to_string(),
        failure_threshold,
        success_threshold,
        interval: 60,
        ..Default::default()
    }
}

/// A request seen by the mock Cloudflare API.
#[derive(Debug, Clone)]
pub struct CloudflareCall {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
    pub auth_key: Option<String>,
    pub auth_email: Option<String>,
    pub body: Option<Value>,
}

/// In-memory Cloudflare zones and records.
#[derive(Clone, Default)]
pub struct MockCloudflare {
    zones: Arc<Mutex<Vec<Value>>>,
    /// Record JSON plus a `zone_id`; an empty zone matches every zone.
    records: Arc<Mutex<Vec<Value>>>,
    calls: Arc<Mutex<Vec<CloudflareCall>>>,
    next_id: Arc<AtomicUsize>,
    /// Items per list page; `0` returns everything on one page.
    page_size: usize,
}

impl MockCloudflare {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// A-record named `name`, visible in every zone.
    pub fn add_record(&self, name: &str, id: &str) {
        self.records.lock().unwrap().push(json!({
            "id": id,
            "zone_id": "",
            "type": "A",
            "name": name,
            "content": "0.0.0.0",
            "proxied": false,
            "ttl": 1,
        }));
    }

    pub fn add_zone_record(&self, zone: &str, id: &str, record_type: &str, name: &str, content: &str) {
        self.records.lock().unwrap().push(json!({
            "id": id,
            "zone_id": zone,
            "type": record_type,
            "name": name,
            "content": content,
            "proxied": false,
            "ttl": 300,
        }));
    }

    pub fn add_zone(&self, id: &str, name: &str) {
        self.zones
            .lock()
            .unwrap()
            .push(json!({ "id": id, "name": name, "status": "active" }));
    }

    /// Stored record by id, without the `zone_id` bookkeeping field.
    pub fn record(&self, id: &str) -> Option<Value> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r["id"] == id)
            .map(|r| {
                let mut r = r.clone();
                r.as_object_mut().unwrap().remove("zone_id");
                r
            })
    }

    pub fn calls(&self) -> Vec<CloudflareCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<CloudflareCall> {
        self.calls().into_iter().filter(|c| c.method == "PUT").collect()
    }

    fn page(&self, items: Vec<Value>, query: &HashMap<String, String>) -> Value {
        if self.page_size == 0 {
            return json!({ "success": true, "errors": [], "result": items });
        }
        let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let total_pages = items.len().div_ceil(self.page_size).max(1);
        let result: Vec<Value> = items
            .into_iter()
            .skip((page - 1) * self.page_size)
            .take(self.page_size)
            .collect();
        json!({
            "success": true,
            "errors": [],
            "result": result,
            "result_info": { "page": page, "per_page": self.page_size, "total_pages": total_pages },
        })
    }
}

fn in_zone(record: &Value, zone: &str) -> bool {
    record["zone_id"] == "" || record["zone_id"] == zone
}

fn public(record: &Value) -> Value {
    let mut record = record.clone();
    record.as_object_mut().unwrap().remove("zone_id");
    record
}

fn ok(result: Value) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "errors": [], "result": result })),
    )
}

fn failure(status: StatusCode, code: i64, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "success": false,
            "errors": [{ "code": code, "message": message }],
            "result": null
        })),
    )
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn record_call(
    mock: &MockCloudflare,
    method: &'static str,
    path: String,
    headers: &HeaderMap,
    body: Option<Value>,
) {
    mock.calls.lock().unwrap().push(CloudflareCall {
        method,
        path,
        authorization: header(headers, "authorization"),
        auth_key: header(headers, "x-auth-key"),
        auth_email: header(headers, "x-auth-email"),
        body,
    });
}

async fn list_zones(
    State(mock): State<MockCloudflare>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    record_call(&mock, "GET", "/zones".to_string(), &headers, None);
    let zones = mock.zones.lock().unwrap().clone();
    Json(mock.page(zones, &query))
}

async fn list_records(
    State(mock): State<MockCloudflare>,
    Path(zone): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record_call(&mock, "GET", format!("/zones/{zone}/dns_records"), &headers, None);

    if zone == "forbidden" {
        return failure(StatusCode::FORBIDDEN, 9109, "Invalid access token");
    }

    let name = query.get("name");
    let records: Vec<Value> = mock
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|r| in_zone(r, &zone))
        .filter(|r| name.is_none_or(|n| r["name"] == n.as_str()))
        .map(public)
        .collect();
    (StatusCode::OK, Json(mock.page(records, &query)))
}

async fn create_record(
    State(mock): State<MockCloudflare>,
    Path(zone): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_call(
        &mock,
        "POST",
        format!("/zones/{zone}/dns_records"),
        &headers,
        Some(body.clone()),
    );
    let id = format!("new-{}", mock.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    let mut record = body;
    record["id"] = json!(id);
    record["zone_id"] = json!(zone);
    mock.records.lock().unwrap().push(record.clone());
    ok(public(&record))
}

async fn get_record(
    State(mock): State<MockCloudflare>,
    Path((zone, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record_call(&mock, "GET", format!("/zones/{zone}/dns_records/{id}"), &headers, None);
    match mock
        .records
        .lock()
        .unwrap()
        .iter()
        .find(|r| r["id"] == id.as_str() && in_zone(r, &zone))
    {
        Some(record) => ok(public(record)),
        None => failure(StatusCode::NOT_FOUND, 81044, "Record does not exist."),
    }
}

async fn update_record(
    State(mock): State<MockCloudflare>,
    Path((zone, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_call(
        &mock,
        "PUT",
        format!("/zones/{zone}/dns_records/{id}"),
        &headers,
        Some(body.clone()),
    );
    let mut records = mock.records.lock().unwrap();
    let Some(record) = records
        .iter_mut()
        .find(|r| r["id"] == id.as_str() && in_zone(r, &zone))
    else {
        return failure(StatusCode::NOT_FOUND, 81044, "Record does not exist.");
    };
    let zone_id = record["zone_id"].clone();
    *record = body;
    record["id"] = json!(id);
    record["zone_id"] = zone_id;
    ok(public(record))
}

async fn delete_record(
    State(mock): State<MockCloudflare>,
    Path((zone, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record_call(&mock, "DELETE", format!("/zones/{zone}/dns_records/{id}"), &headers, None);
    let mut records = mock.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| !(r["id"] == id.as_str() && in_zone(r, &zone)));
    if records.len() == before {
        return failure(StatusCode::NOT_FOUND, 81044, "Record does not exist.");
    }
    ok(json!({ "id": id }))
}

/// Serve a minimal Cloudflare v4 API on an ephemeral port. Returns its base URL.
pub async fn start_mock_cloudflare(mock: MockCloudflare) -> String {
    let app = Router::new()
        .route("/zones", get(list_zones))
        .route("/zones/{zone}/dns_records", get(list_records).post(create_record))
        .route(
            "/zones/{zone}/dns_records/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(mock);
    let addr = serve(app).await;
    format!("http://{addr}")
}

/// Serve `app` on 127.0.0.1 with an ephemeral port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
