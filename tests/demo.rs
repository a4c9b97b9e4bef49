use parcel_tracker::config::Config;
use parcel_tracker::{demo, ParcelService, ParcelStatus, ParcelStore, ServiceError};

mod common;
use common::MemoryParcelStore;

#[tokio::test]
async fn demo_keeps_sent_parcel_and_removes_registered_one() {
    let service = ParcelService::new(MemoryParcelStore::new());
    let config = Config::default();
    let mut reports = Vec::new();

    demo::run(&service, &config, |report| reports.push(report))
        .await
        .unwrap();

    assert_eq!(reports.len(), 3);
    assert!(reports[0].contains(&format!("parcel #1 to {}", config.new_address)));
    assert!(reports[0].contains("status sent"));
    // The refused deletion leaves the listing unchanged.
    assert_eq!(reports[1], reports[0]);
    assert_eq!(reports[2], reports[0]);
    assert!(!reports[2].contains("parcel #2"));

    let kept = service.store().get(1).await.unwrap();
    assert_eq!(kept.status, ParcelStatus::Sent);
    assert_eq!(service.store().get_by_client(config.client_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn demo_stops_at_first_storage_failure() {
    let service = ParcelService::new(MemoryParcelStore::failing());
    let mut reports = Vec::new();

    let err = demo::run(&service, &Config::default(), |report| reports.push(report))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Registration { client_id: 1, .. }));
    assert!(reports.is_empty());
}

#[tokio::test]
async fn demo_stops_when_delete_fails_for_another_reason() {
    let service = ParcelService::new(MemoryParcelStore::failing_on("delete parcel"));
    let mut reports = Vec::new();

    let err = demo::run(&service, &Config::default(), |report| reports.push(report))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Deletion { id: 1, .. }));
    assert_eq!(reports.len(), 1);
}
