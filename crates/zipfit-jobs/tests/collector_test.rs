//! Registry collector and expiry sweep integration tests.

mod support;

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use support::*;
use zipfit_core::{
    DocumentRepository, HousingCategory, OfferRepository, Provenance, RegistryRecord,
};
use zipfit_jobs::RegistryCollector;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(external_id: &str, name: &str, end: NaiveDate) -> RegistryRecord {
    RegistryRecord {
        external_id: external_id.to_string(),
        name: name.to_string(),
        region: "경기".to_string(),
        address: Some("경기도 성남시".to_string()),
        housing_category: Some("아파트".to_string()),
        min_price: Some(300_000_000),
        max_price: Some(500_000_000),
        application_start: date(2026, 8, 1),
        application_end: end,
    }
}

#[tokio::test]
async fn test_collect_creates_new_registry_offers() {
    let fixtures = Fixtures::new();
    let feed = Arc::new(StaticRegistryFeed::new(vec![
        record("PB-001", "행복주택 1단지", date(2026, 9, 1)),
        record("PB-002", "행복주택 2단지", date(2026, 9, 15)),
    ]));
    let collector = RegistryCollector::new(feed, fixtures.offers.clone());

    let report = collector.collect_once(date(2026, 8, 7)).await.unwrap();
    assert_eq!(report.created, 2);
    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped, 0);

    let offers = fixtures.offers.all().await;
    assert_eq!(offers.len(), 2);
    assert!(offers.iter().all(|o| o.provenance == Provenance::Registry));
    assert!(offers.iter().all(|o| o.active));
    assert_eq!(offers[0].category, HousingCategory::Apartment);
}

#[tokio::test]
async fn test_collect_refreshes_existing_offer_by_external_id() {
    let fixtures = Fixtures::new();

    // First run creates, second run refreshes with new data.
    let feed = Arc::new(StaticRegistryFeed::new(vec![record(
        "PB-001",
        "행복주택 1단지",
        date(2026, 9, 1),
    )]));
    let collector = RegistryCollector::new(feed, fixtures.offers.clone());
    collector.collect_once(date(2026, 8, 7)).await.unwrap();

    let feed = Arc::new(StaticRegistryFeed::new(vec![record(
        "PB-001",
        "행복주택 1단지 (변경)",
        date(2026, 10, 1),
    )]));
    let collector = RegistryCollector::new(feed, fixtures.offers.clone());
    let report = collector.collect_once(date(2026, 8, 14)).await.unwrap();

    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 1);

    let offers = fixtures.offers.all().await;
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].name, "행복주택 1단지 (변경)");
    assert_eq!(offers[0].application_end, date(2026, 10, 1));
    assert_eq!(offers[0].provenance, Provenance::Registry);
}

#[tokio::test]
async fn test_collect_refresh_preserves_merge_state() {
    let fixtures = Fixtures::new();
    let feed = Arc::new(StaticRegistryFeed::new(vec![record(
        "PB-001",
        "행복주택 1단지",
        date(2026, 9, 1),
    )]));
    let collector = RegistryCollector::new(feed.clone(), fixtures.offers.clone());
    collector.collect_once(date(2026, 8, 7)).await.unwrap();

    // A document merged into this offer between feed runs.
    let offer = fixtures
        .offers
        .find_by_external_id("PB-001")
        .await
        .unwrap()
        .unwrap();
    let document_id = Uuid::new_v4();
    fixtures.offers.mark_merged(offer.id, document_id).await.unwrap();

    let collector = RegistryCollector::new(feed, fixtures.offers.clone());
    collector.collect_once(date(2026, 8, 14)).await.unwrap();

    let refreshed = fixtures.offers.fetch(offer.id).await.unwrap();
    assert_eq!(refreshed.provenance, Provenance::Merged);
    assert_eq!(refreshed.document_id, Some(document_id));
}

#[tokio::test]
async fn test_sweep_deactivates_only_expired_offers() {
    let fixtures = Fixtures::new();
    let feed = Arc::new(StaticRegistryFeed::new(vec![
        record("PB-001", "지난 청약", date(2026, 8, 1)),
        record("PB-002", "진행중 청약", date(2026, 8, 7)),
        record("PB-003", "예정 청약", date(2026, 12, 31)),
    ]));
    let collector = RegistryCollector::new(feed, fixtures.offers.clone());
    collector.collect_once(date(2026, 8, 7)).await.unwrap();

    let deactivated = collector.sweep_once(date(2026, 8, 7)).await.unwrap();
    // Only the offer whose window closed strictly before today.
    assert_eq!(deactivated, 1);

    let offers = fixtures.offers.all().await;
    let expired = offers
        .iter()
        .find(|o| o.external_id.as_deref() == Some("PB-001"))
        .unwrap();
    assert!(!expired.active);
    // Boundary day (end == today) stays active.
    let ongoing = offers
        .iter()
        .find(|o| o.external_id.as_deref() == Some("PB-002"))
        .unwrap();
    assert!(ongoing.active);

    // A second sweep finds nothing new.
    assert_eq!(collector.sweep_once(date(2026, 8, 7)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sweep_never_touches_documents_or_outcomes() {
    let fixtures = Fixtures::new();
    let dir = tempfile::tempdir().unwrap();
    let document = store_document(
        &fixtures,
        dir.path(),
        Uuid::new_v4(),
        b"%PDF-1.4 untouched",
        "application/pdf",
    )
    .await;

    let feed = Arc::new(StaticRegistryFeed::new(vec![record(
        "PB-001",
        "지난 청약",
        date(2026, 1, 1),
    )]));
    let collector = RegistryCollector::new(feed, fixtures.offers.clone());
    collector.collect_once(date(2026, 8, 7)).await.unwrap();
    collector.sweep_once(date(2026, 8, 7)).await.unwrap();

    let stored = fixtures.documents.fetch(document.id).await.unwrap();
    assert_eq!(stored.status, zipfit_core::DocumentStatus::Pending);
    assert_eq!(fixtures.outcomes.count().await, 0);
}
