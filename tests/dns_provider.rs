//! Cloudflare provider against a local mock of the v4 API.

mod common;

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::json;

use common::{start_mock_cloudflare, MockCloudflare};
use dns_failover::config::{CloudflareConfig, IntegrationsConfig};
use dns_failover::dns::{BulkUpdate, CloudflareDns, DnsError, DnsProvider, RecordInput};

fn provider(api_base: &str, creds: CloudflareConfig) -> CloudflareDns {
    let config = IntegrationsConfig {
        cloudflare: CloudflareConfig {
            api_base: api_base.to_string(),
            ..creds
        },
        ..Default::default()
    };
    CloudflareDns::new(Arc::new(ArcSwap::from_pointee(config)))
}

fn token(value: &str) -> CloudflareConfig {
    CloudflareConfig {
        api_token: value.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn looks_up_then_rewrites_the_record() {
    let mock = MockCloudflare::default();
    mock.add_record("www.example.com", "rec-1");
    let base = start_mock_cloudflare(mock.clone()).await;

    let dns = provider(&base, token("cf-token"));
    dns.update_record("zone-1", "www.example.com", "192.0.2.20", true)
        .await
        .unwrap();

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].method, "GET");
    assert_eq!(calls[0].path, "/zones/zone-1/dns_records");
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer cf-token"));

    assert_eq!(calls[1].method, "PUT");
    assert_eq!(calls[1].path, "/zones/zone-1/dns_records/rec-1");
    let body = calls[1].body.clone().unwrap();
    assert_eq!(body["type"], json!("A"));
    assert_eq!(body["name"], json!("www.example.com"));
    assert_eq!(body["content"], json!("192.0.2.20"));
    assert_eq!(body["proxied"], json!(true));
}

#[tokio::test]
async fn ipv6_targets_use_aaaa_records() {
    let mock = MockCloudflare::default();
    mock.add_record("v6.example.com", "rec-6");
    let base = start_mock_cloudflare(mock.clone()).await;

    let dns = provider(&base, token("cf-token"));
    dns.update_record("zone-1", "v6.example.com", "2001:db8::20", false)
        .await
        .unwrap();

    let body = mock.updates()[0].body.clone().unwrap();
    assert_eq!(body["type"], json!("AAAA"));
    assert_eq!(body["proxied"], json!(false));
}

#[tokio::test]
async fn global_key_and_email_are_sent_as_headers() {
    let mock = MockCloudflare::default();
    mock.add_record("www.example.com", "rec-1");
    let base = start_mock_cloudflare(mock.clone()).await;

    let creds = CloudflareConfig {
        api_key: "global-key".into(),
        email: "ops@example.com".into(),
        ..Default::default()
    };
    provider(&base, creds)
        .update_record("zone-1", "www.example.com", "192.0.2.20", false)
        .await
        .unwrap();

    for call in mock.calls() {
        assert_eq!(call.authorization, None);
        assert_eq!(call.auth_key.as_deref(), Some("global-key"));
        assert_eq!(call.auth_email.as_deref(), Some("ops@example.com"));
    }
}

#[tokio::test]
async fn unknown_record_is_reported_without_an_update() {
    let mock = MockCloudflare::default();
    let base = start_mock_cloudflare(mock.clone()).await;

    let err = provider(&base, token("cf-token"))
        .update_record("zone-1", "missing.example.com", "192.0.2.20", false)
        .await
        .unwrap_err();

    assert!(matches!(err, DnsError::RecordNotFound(name) if name == "missing.example.com"));
    assert!(mock.updates().is_empty());
}

#[tokio::test]
async fn api_errors_carry_the_provider_message() {
    let mock = MockCloudflare::default();
    let base = start_mock_cloudflare(mock.clone()).await;

    let err = provider(&base, token("bad-token"))
        .update_record("forbidden", "www.example.com", "192.0.2.20", false)
        .await
        .unwrap_err();

    match err {
        DnsError::Api(message) => {
            assert!(message.contains("403"), "{message}");
            assert!(message.contains("Invalid access token"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn credential_changes_apply_without_rebuilding_the_provider() {
    let mock = MockCloudflare::default();
    mock.add_record("www.example.com", "rec-1");
    let base = start_mock_cloudflare(mock.clone()).await;

    let config = Arc::new(ArcSwap::from_pointee(IntegrationsConfig {
        cloudflare: CloudflareConfig {
            api_base: base.clone(),
            ..token("old")
        },
        ..Default::default()
    }));
    let dns = CloudflareDns::new(config.clone());

    config.store(Arc::new(IntegrationsConfig {
        cloudflare: CloudflareConfig {
            api_base: base,
            ..token("rotated")
        },
        ..Default::default()
    }));
    dns.update_record("zone-1", "www.example.com", "192.0.2.20", false)
        .await
        .unwrap();

    assert_eq!(
        mock.calls()[0].authorization.as_deref(),
        Some("Bearer rotated")
    );
}

#[tokio::test]
async fn zone_listing_follows_every_page() {
    let mock = MockCloudflare::default().with_page_size(2);
    for i in 1..=5 {
        mock.add_zone(&format!("zone-{i}"), &format!("example{i}.com"));
    }
    let base = start_mock_cloudflare(mock.clone()).await;

    let zones = provider(&base, token("cf-token")).list_zones().await.unwrap();
    let names: Vec<_> = zones.iter().map(|z| z.name.as_str()).collect();
    assert_eq!(
        names,
        ["example1.com", "example2.com", "example3.com", "example4.com", "example5.com"]
    );
    assert_eq!(mock.calls().len(), 3);
}

#[tokio::test]
async fn records_are_filtered_by_zone_and_search_text() {
    let mock = MockCloudflare::default();
    mock.add_zone_record("zone-1", "r1", "A", "www.example.com", "192.0.2.1");
    mock.add_zone_record("zone-1", "r2", "MX", "example.com", "mail.example.com");
    mock.add_zone_record("zone-2", "r3", "A", "www.other.test", "192.0.2.3");
    let base = start_mock_cloudflare(mock).await;
    let dns = provider(&base, token("cf-token"));

    assert_eq!(dns.list_records("zone-1", None).await.unwrap().len(), 2);
    let named = dns
        .list_records("zone-1", Some("example.com"))
        .await
        .unwrap();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].record_type, "MX");

    let hits = dns.search_records("zone-1", "MAIL").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "r2");
    assert!(dns.search_records("zone-1", "other").await.unwrap().is_empty());
}

#[tokio::test]
async fn record_lifecycle_by_id() {
    let mock = MockCloudflare::default();
    let base = start_mock_cloudflare(mock.clone()).await;
    let dns = provider(&base, token("cf-token"));

    let input = RecordInput {
        record_type: "AAAA".into(),
        name: "v6.example.com".into(),
        content: "2001:db8::1".into(),
        ttl: 120,
        proxied: true,
    };
    let created = dns.create_record("zone-1", &input).await.unwrap();
    assert_eq!(created.record_type, "AAAA");
    assert_eq!(created.ttl, 120);

    let fetched = dns.get_record("zone-1", &created.id).await.unwrap();
    assert_eq!(fetched, created);

    let replaced = dns
        .update_record_by_id(
            "zone-1",
            &created.id,
            &RecordInput {
                content: "2001:db8::2".into(),
                ..input
            },
        )
        .await
        .unwrap();
    assert_eq!(replaced.content, "2001:db8::2");

    dns.delete_record("zone-1", &created.id).await.unwrap();
    let err = dns.get_record("zone-1", &created.id).await.unwrap_err();
    assert!(matches!(err, DnsError::NotFound(_)), "{err:?}");
    assert!(mock.record(&created.id).is_none());
}

#[tokio::test]
async fn bulk_update_keeps_unset_fields_and_continues_past_failures() {
    let mock = MockCloudflare::default();
    mock.add_zone_record("zone-1", "r1", "A", "www.example.com", "192.0.2.1");
    mock.add_zone_record("zone-1", "r2", "A", "api.example.com", "192.0.2.2");
    let base = start_mock_cloudflare(mock.clone()).await;
    let dns = provider(&base, token("cf-token"));

    let results = dns
        .bulk_update(
            "zone-1",
            &[
                BulkUpdate {
                    record_id: "gone".into(),
                    content: "192.0.2.9".into(),
                    ..Default::default()
                },
                BulkUpdate {
                    record_id: "r1".into(),
                    ttl: 60,
                    ..Default::default()
                },
                BulkUpdate {
                    record_id: "r2".into(),
                    content: "192.0.2.22".into(),
                    ..Default::default()
                },
            ],
        )
        .await;

    let outcome: Vec<_> = results.iter().map(|r| (r.record_id.as_str(), r.success)).collect();
    assert_eq!(outcome, [("gone", false), ("r1", true), ("r2", true)]);

    let r1 = mock.record("r1").unwrap();
    assert_eq!(r1["content"], "192.0.2.1");
    assert_eq!(r1["ttl"], 60);
    let r2 = mock.record("r2").unwrap();
    assert_eq!(r2["content"], "192.0.2.22");
    assert_eq!(r2["ttl"], 300);
    assert_eq!(r2["name"], "api.example.com");
}
