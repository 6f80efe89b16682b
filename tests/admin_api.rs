//! Admin API exercised through the Rust SDK against a live server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use reqwest::StatusCode;
use tempfile::TempDir;

use common::{serve, start_mock_cloudflare, MockCloudflare, ScriptedProber, BACKUP, PRIMARY};
use failover_sdk::{BulkUpdate, CloudflareAccount, RecordInput};
use dns_failover::admin::{setup_admin_router, AdminState};
use dns_failover::alerts::Notifier;
use dns_failover::config::{CloudflareConfig, IntegrationsConfig};
use dns_failover::dns::CloudflareDns;
use dns_failover::failover::{EventLimits, FailoverSink};
use dns_failover::store::Store;
use dns_failover::{Engine, Shutdown};
use failover_sdk::{AdminClient, MonitorDefinition};

const API_KEY: &str = "test-key";

struct TestServer {
    base_url: String,
    cloudflare: MockCloudflare,
    engine: Arc<Engine>,
    store: Arc<Store>,
    _shutdown: Shutdown,
    _dir: TempDir,
}

impl TestServer {
    fn client(&self) -> AdminClient {
        AdminClient::new(&self.base_url).with_api_key(API_KEY)
    }
}

async fn start_server() -> TestServer {
    start_server_with_key(API_KEY).await
}

async fn start_server_with_key(api_key: &str) -> TestServer {
    let cloudflare = MockCloudflare::default();
    cloudflare.add_record("www.example.com", "rec-www");
    let cf_base = start_mock_cloudflare(cloudflare.clone()).await;

    let integrations = Arc::new(ArcSwap::from_pointee(IntegrationsConfig {
        cloudflare: CloudflareConfig {
            api_token: "cf-token".into(),
            api_base: cf_base,
            ..Default::default()
        },
        ..Default::default()
    }));

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::open(dir.path().join("data.json")).unwrap());
    let dns = Arc::new(CloudflareDns::with_accounts(integrations.clone(), store.clone()));
    let failover = Arc::new(FailoverSink::new(
        dns.clone(),
        Arc::new(Notifier::new(integrations.clone())),
        store.clone(),
        EventLimits::default(),
    ));

    let shutdown = Shutdown::new();
    let engine = Arc::new(Engine::new(
        ScriptedProber::new(true),
        failover.clone(),
        shutdown.subscribe(),
    ));

    let state = AdminState::new(
        engine.clone(),
        store.clone(),
        failover,
        dns,
        integrations,
        api_key,
    );
    let addr = serve(setup_admin_router(state, Duration::from_secs(5))).await;

    TestServer {
        base_url: format!("http://{addr}"),
        cloudflare,
        engine,
        store,
        _shutdown: shutdown,
        _dir: dir,
    }
}

fn definition(name: &str) -> MonitorDefinition {
    MonitorDefinition {
        name: name.to_string(),
        zone_id: "zone-1".into(),
        subdomains: vec!["www.example.com".into()],
        original_ip: PRIMARY.into(),
        backup_ip: BACKUP.into(),
        failure_threshold: 3,
        success_threshold: 2,
        interval: 60,
        ..Default::default()
    }
}

#[tokio::test]
async fn healthz_is_open_but_api_requires_the_key() {
    let server = start_server().await;

    let anonymous = AdminClient::new(&server.base_url);
    assert!(anonymous.healthz().await.unwrap());

    let err = anonymous.list_monitors().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    let wrong = AdminClient::new(&server.base_url).with_api_key("nope");
    let err = wrong.status().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    assert!(server.client().list_monitors().await.unwrap().is_empty());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let server = start_server().await;

    let resp = reqwest::get(format!("{}/healthz", server.base_url))
        .await
        .unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn monitor_crud_starts_and_stops_monitoring() {
    let server = start_server().await;
    let client = server.client();

    let created = client.create_monitor(&definition("web")).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.check_type, "ping");
    assert!(server.engine.is_monitoring(&created.id).await);

    let listed = client.list_monitors().await.unwrap();
    assert_eq!(listed, vec![created.clone()]);

    let status = client.status().await.unwrap();
    assert_eq!(status.system.active_monitors, 1);
    assert_eq!(status.monitors.len(), 1);
    assert_eq!(status.monitors[0].status, "Normal");
    assert_eq!(status.monitors[0].current_ip, PRIMARY);

    let mut changed = created.clone();
    changed.name = "web-renamed".into();
    changed.check_type = "tcp".into();
    changed.check_target = format!("{PRIMARY}:443");
    let updated = client.update_monitor(&created.id, &changed).await.unwrap();
    assert_eq!(updated.name, "web-renamed");
    let view = server.engine.monitor_status(&created.id).await.unwrap();
    assert_eq!(view.check_type, "tcp");

    client.delete_monitor(&created.id).await.unwrap();
    assert!(!server.engine.is_monitoring(&created.id).await);
    assert!(client.list_monitors().await.unwrap().is_empty());

    let err = client.delete_monitor(&created.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn invalid_monitor_is_rejected_with_details() {
    let server = start_server().await;
    let client = server.client();

    let mut bad = definition("bad");
    bad.original_ip = "not-an-ip".into();
    bad.check_type = "udp".into();

    let err = client.create_monitor(&bad).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    match err {
        failover_sdk::SdkError::Api { body, .. } => assert_eq!(body.details.len(), 2),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.list_monitors().await.unwrap().is_empty());
    assert!(server.engine.active_monitors().await.is_empty());
}

#[tokio::test]
async fn updating_an_unknown_monitor_is_not_found() {
    let server = start_server().await;

    let err = server
        .client()
        .update_monitor("missing", &definition("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn restore_points_dns_back_at_the_primary_and_records_history() {
    let server = start_server().await;
    let client = server.client();

    let created = client.create_monitor(&definition("web")).await.unwrap();

    let record = client.restore(&created.id, Some(true)).await.unwrap();
    assert_eq!(record.reason, "restore");
    assert_eq!(record.to_ip, PRIMARY);
    assert!(!record.to_backup);

    let updates = server.cloudflare.updates();
    assert_eq!(updates.len(), 1);
    let body = updates[0].body.clone().unwrap();
    assert_eq!(body["content"], PRIMARY);
    assert_eq!(body["proxied"], true);

    let history = client.history(10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].monitor_id, created.id);

    let status = client.status().await.unwrap();
    assert_eq!(status.history.len(), 1);
}

#[tokio::test]
async fn restore_without_zone_is_a_bad_request() {
    let server = start_server().await;
    let client = server.client();

    let mut def = definition("no-zone");
    def.zone_id.clear();
    let created = client.create_monitor(&def).await.unwrap();

    let err = client.restore(&created.id, None).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert!(server.cloudflare.updates().is_empty());

    let err = client.restore("missing", None).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn ip_down_log_starts_empty() {
    let server = start_server().await;

    assert!(server.client().ip_down(0).await.unwrap().is_empty());
    assert!(server.client().history(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_update_and_delete_keep_engine_and_store_in_agreement() {
    let server = start_server().await;
    let client = server.client();

    for round in 0..20 {
        let created = client
            .create_monitor(&definition(&format!("race-{round}")))
            .await
            .unwrap();
        let mut changed = created.clone();
        changed.interval = 30;

        let (_, _) = tokio::join!(
            client.update_monitor(&created.id, &changed),
            client.delete_monitor(&created.id),
        );

        let stored = server.store.get_monitor(&created.id).is_some();
        let running = server.engine.is_monitoring(&created.id).await;
        assert_eq!(stored, running, "round {round}");
        assert!(!running, "round {round}");
    }
    assert!(server.engine.active_monitors().await.is_empty());
}

fn record(record_type: &str, name: &str, content: &str) -> RecordInput {
    RecordInput {
        record_type: record_type.into(),
        name: name.into(),
        content: content.into(),
        ttl: 1,
        proxied: false,
    }
}

#[tokio::test]
async fn zones_and_records_are_managed_through_the_api() {
    let server = start_server().await;
    let client = server.client();
    server.cloudflare.add_zone("zone-1", "example.com");
    server
        .cloudflare
        .add_zone_record("zone-1", "r-a", "A", "api.example.com", "192.0.2.1");
    server
        .cloudflare
        .add_zone_record("zone-1", "r-txt", "TXT", "example.com", "v=spf1 -all");

    let zones = client.list_zones().await.unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].name, "example.com");

    // the shared www record is visible in every zone
    assert_eq!(client.list_records("zone-1", None).await.unwrap().len(), 3);
    let found = client.list_records("zone-1", Some("SPF")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "r-txt");

    let created = client
        .create_record("zone-1", &record("A", "new.example.com", "192.0.2.5"))
        .await
        .unwrap();
    assert_eq!(created.name, "new.example.com");
    assert_eq!(
        server.cloudflare.record(&created.id).unwrap()["content"],
        "192.0.2.5"
    );

    let updated = client
        .update_record("zone-1", "r-a", &record("A", "api.example.com", "192.0.2.9"))
        .await
        .unwrap();
    assert_eq!(updated.content, "192.0.2.9");

    client.delete_record("zone-1", "r-txt").await.unwrap();
    assert!(server.cloudflare.record("r-txt").is_none());
    let err = client.delete_record("zone-1", "r-txt").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    let err = client
        .create_record("zone-1", &record("A", "", "192.0.2.5"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn bulk_update_reports_each_record() {
    let server = start_server().await;
    server
        .cloudflare
        .add_zone_record("zone-1", "r-a", "A", "api.example.com", "192.0.2.1");

    let results = server
        .client()
        .bulk_update_records(
            "zone-1",
            &[
                BulkUpdate {
                    record_id: "r-a".into(),
                    content: "192.0.2.77".into(),
                    proxied: Some(true),
                    ..Default::default()
                },
                BulkUpdate {
                    record_id: "missing".into(),
                    content: "192.0.2.78".into(),
                    ..Default::default()
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1].error.is_some());

    let stored = server.cloudflare.record("r-a").unwrap();
    assert_eq!(stored["content"], "192.0.2.77");
    assert_eq!(stored["proxied"], true);
    assert_eq!(stored["name"], "api.example.com");
    assert_eq!(stored["type"], "A");
    assert_eq!(stored["ttl"], 300);
}

#[tokio::test]
async fn config_update_applies_to_the_next_dns_call() {
    let server = start_server().await;
    let client = server.client();

    let mut settings = client.get_config().await.unwrap();
    assert_eq!(settings.cloudflare.api_token, "cf-token");

    settings.cloudflare.api_token = "rotated".into();
    settings.notifications.webhook.url = "http://127.0.0.1:9/hook".into();
    let saved = client.update_config(&settings).await.unwrap();
    assert_eq!(saved, settings);
    assert_eq!(client.get_config().await.unwrap(), settings);

    let persisted = server.store.integrations().unwrap();
    assert_eq!(persisted.cloudflare.api_token, "rotated");

    let created = client.create_monitor(&definition("web")).await.unwrap();
    client.restore(&created.id, None).await.unwrap();
    let updates = server.cloudflare.updates();
    assert_eq!(updates[0].authorization.as_deref(), Some("Bearer rotated"));
}

fn account(name: &str, token: &str) -> CloudflareAccount {
    CloudflareAccount {
        name: name.into(),
        api_token: token.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn active_account_supplies_dns_credentials() {
    let server = start_server().await;
    let client = server.client();

    let err = client.create_account(&account("empty", "")).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let first = client.create_account(&account("first", "acct-1")).await.unwrap();
    let second = client.create_account(&account("second", "acct-2")).await.unwrap();
    assert!(!first.id.is_empty());
    assert_ne!(first.id, second.id);

    let listed = client.list_accounts().await.unwrap();
    assert_eq!(listed.accounts.len(), 2);
    assert_eq!(listed.active_id.as_deref(), Some(first.id.as_str()));

    let listed = client.activate_account(&second.id).await.unwrap();
    assert_eq!(listed.active_id.as_deref(), Some(second.id.as_str()));

    let created = client.create_monitor(&definition("web")).await.unwrap();
    client.restore(&created.id, None).await.unwrap();
    assert_eq!(
        server.cloudflare.updates()[0].authorization.as_deref(),
        Some("Bearer acct-2")
    );

    client.delete_account(&second.id).await.unwrap();
    let listed = client.list_accounts().await.unwrap();
    assert_eq!(listed.active_id.as_deref(), Some(first.id.as_str()));

    let mut renamed = first.clone();
    renamed.name = "primary".into();
    assert_eq!(client.update_account(&first.id, &renamed).await.unwrap().name, "primary");

    for err in [
        client.delete_account(&second.id).await.unwrap_err(),
        client.activate_account(&second.id).await.unwrap_err(),
        client.update_account(&second.id, &renamed).await.unwrap_err(),
    ] {
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }
}

#[tokio::test]
async fn first_login_sets_the_token_for_an_open_server() {
    let server = start_server_with_key("").await;
    let anonymous = AdminClient::new(&server.base_url);

    let status = anonymous.auth_status().await.unwrap();
    assert!(status.need_setup);
    assert!(anonymous.list_monitors().await.unwrap().is_empty());

    let err = anonymous.login("  ").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let login = anonymous.login("chosen-token").await.unwrap();
    assert!(login.authenticated);
    assert!(login.token_created);
    assert_eq!(server.store.auth_token().as_deref(), Some("chosen-token"));

    let err = anonymous.list_monitors().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    let authed = AdminClient::new(&server.base_url).with_api_key("chosen-token");
    assert!(authed.list_monitors().await.unwrap().is_empty());

    let err = anonymous.login("guess").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    let again = anonymous.login("chosen-token").await.unwrap();
    assert!(!again.token_created);

    let status = anonymous.auth_status().await.unwrap();
    assert!(status.has_token);
    assert!(!status.need_setup);
}

#[tokio::test]
async fn configured_key_is_the_only_login_token() {
    let server = start_server().await;
    let anonymous = AdminClient::new(&server.base_url);

    assert!(anonymous.auth_status().await.unwrap().has_token);
    assert!(!anonymous.login(API_KEY).await.unwrap().token_created);

    let err = anonymous.login("other").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(server.store.auth_token().is_none());
}
