//! Integration tests for a full collection run against in-memory fakes

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use zzz_records_archiver::collector::{
    CollectError, Collector, CollectorConfig, ModeError, ModeOutcome, PersistStatus, RunState,
};
use zzz_records_archiver::store::{ArtifactStore, FileNaming};
use zzz_records_archiver::Mode;

use crate::common::{
    deadly_assault_body, error_body, shiyu_legacy_body, shiyu_v2_body, void_front_body, Event,
    FakeApi, FakeAuthenticator, RecordingNotifier, UID,
};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, day, hour, 0, 0).unwrap()
}

struct Harness {
    dir: TempDir,
    api: Arc<FakeApi>,
    notifier: Arc<RecordingNotifier>,
    collector: Collector,
}

impl Harness {
    fn new(api: FakeApi, config: CollectorConfig) -> Self {
        Self::build(api, config, false)
    }

    fn build(api: FakeApi, config: CollectorConfig, reject_auth: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(api);
        let notifier = Arc::new(RecordingNotifier::new());
        let authenticator = if reject_auth {
            FakeAuthenticator::rejecting(api.clone())
        } else {
            FakeAuthenticator::new(api.clone())
        };
        let collector = Collector::new(
            ArtifactStore::new(dir.path()),
            Arc::new(authenticator),
            notifier.clone(),
            config,
        );
        Self {
            dir,
            api,
            notifier,
            collector,
        }
    }

    fn store(&self) -> ArtifactStore {
        ArtifactStore::new(self.dir.path())
    }
}

fn all_modes_api() -> FakeApi {
    FakeApi::new()
        .with(Mode::DeadlyAssault, deadly_assault_body(1001, 30000))
        .with(Mode::ShiyuDefense, shiyu_legacy_body(62))
        .with(Mode::VoidFront, void_front_body(7))
}

#[tokio::test]
async fn test_full_run_archives_every_mode() {
    let harness = Harness::new(all_modes_api(), CollectorConfig::default());

    let report = harness.collector.run_at(UID, at(5, 12)).await.unwrap();

    assert_eq!(report.succeeded_modes(), Mode::ALL.to_vec());
    assert!(report.failed_modes().is_empty());

    let store = harness.store();
    assert!(store.artifact_path(Mode::DeadlyAssault, "deadly-assault-1001.json").exists());
    assert!(store.artifact_path(Mode::ShiyuDefense, "shiyu-defense-62.json").exists());
    assert!(store.artifact_path(Mode::VoidFront, "void-front-7.json").exists());

    let stored = store.read_latest(Mode::DeadlyAssault).unwrap().unwrap();
    assert_eq!(stored.metadata.uid, UID);
    assert_eq!(stored.metadata.mode, Mode::DeadlyAssault);
    assert_eq!(stored.metadata.export_date, "2025-08-05T12:00:00.000Z");
    assert!(stored.metadata.automated);
    assert_eq!(stored.data.get("total_score"), Some(&json!(30000)));

    for mode in Mode::ALL {
        let mirror = store.read_latest_mirror(mode, UID).unwrap().unwrap();
        assert_eq!(mirror.metadata.mode, mode);
    }

    assert_eq!(
        harness.notifier.events(),
        vec![
            Event::Started(Mode::ALL.to_vec()),
            Event::Success {
                succeeded: Mode::ALL.to_vec(),
                failed: vec![],
            },
        ]
    );
    assert_eq!(harness.collector.state(), RunState::Idle);
}

#[tokio::test]
async fn test_one_failed_mode_does_not_stop_the_others() {
    let api = all_modes_api().with(Mode::ShiyuDefense, error_body(-1, "system busy"));
    let harness = Harness::new(api, CollectorConfig::default());

    let report = harness.collector.run_at(UID, at(5, 12)).await.unwrap();

    assert_eq!(report.succeeded_modes(), vec![Mode::DeadlyAssault, Mode::VoidFront]);
    assert_eq!(report.failed_modes(), vec![Mode::ShiyuDefense]);

    let results = report.results();
    assert!(results["shiyu_defense"].is_null());
    assert_eq!(results["deadly_assault"]["zone_id"], json!(1001));
    assert_eq!(
        results["void_front"]["void_front_battle_abstract_info_brief"]["void_front_id"],
        json!(7)
    );

    let store = harness.store();
    assert!(store.list_files(Mode::ShiyuDefense).unwrap().is_empty());
    assert!(store.read_latest_mirror(Mode::ShiyuDefense, UID).unwrap().is_none());

    let events = harness.notifier.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(
        &events[1],
        Event::ApiFailure(Mode::ShiyuDefense, msg) if msg.contains("system busy")
    ));
    assert_eq!(
        events[2],
        Event::Success {
            succeeded: vec![Mode::DeadlyAssault, Mode::VoidFront],
            failed: vec![Mode::ShiyuDefense],
        }
    );
}

#[tokio::test]
async fn test_unwritable_mode_directory_fails_only_that_mode() {
    let harness = Harness::new(all_modes_api(), CollectorConfig::default());
    // a regular file where the Shiyu Defense directory should be
    std::fs::write(harness.dir.path().join("shiyu-defense"), "not a directory").unwrap();

    let report = harness.collector.run_at(UID, at(5, 12)).await.unwrap();

    assert_eq!(report.succeeded_modes(), vec![Mode::DeadlyAssault, Mode::VoidFront]);
    assert_eq!(report.failed_modes(), vec![Mode::ShiyuDefense]);
    assert!(matches!(
        report.outcome(Mode::ShiyuDefense),
        Some(ModeOutcome::Failed(ModeError::Persist(_)))
    ));

    let store = harness.store();
    assert!(store.artifact_path(Mode::DeadlyAssault, "deadly-assault-1001.json").exists());
    assert!(store.artifact_path(Mode::VoidFront, "void-front-7.json").exists());

    let events = harness.notifier.events();
    assert!(!events.iter().any(|e| matches!(e, Event::ApiFailure(..))));
    assert_eq!(
        events.last(),
        Some(&Event::Success {
            succeeded: vec![Mode::DeadlyAssault, Mode::VoidFront],
            failed: vec![Mode::ShiyuDefense],
        })
    );
    assert_eq!(harness.collector.state(), RunState::Idle);
}

#[tokio::test]
async fn test_unchanged_season_is_not_rewritten() {
    let harness = Harness::new(all_modes_api(), CollectorConfig::default());

    let first = harness.collector.run_at(UID, at(5, 12)).await.unwrap();
    let second = harness.collector.run_at(UID, at(6, 12)).await.unwrap();

    let Some(ModeOutcome::Collected(first_deadly)) = first.outcome(Mode::DeadlyAssault) else {
        panic!("deadly assault should be collected");
    };
    let Some(ModeOutcome::Collected(second_deadly)) = second.outcome(Mode::DeadlyAssault) else {
        panic!("deadly assault should be collected");
    };
    assert!(first_deadly.archive.is_written());
    assert!(matches!(second_deadly.archive, PersistStatus::Unchanged { .. }));
    assert_eq!(first_deadly.archive.path(), second_deadly.archive.path());

    // the archived file keeps its first export date, the mirror follows the latest run
    let store = harness.store();
    let archived = store.read_artifact(second_deadly.archive.path()).unwrap();
    assert_eq!(archived.metadata.export_date, "2025-08-05T12:00:00.000Z");
    let mirror = store.read_latest_mirror(Mode::DeadlyAssault, UID).unwrap().unwrap();
    assert_eq!(mirror.metadata.export_date, "2025-08-06T12:00:00.000Z");
}

#[tokio::test]
async fn test_changed_season_is_rewritten_in_place() {
    let harness = Harness::new(all_modes_api(), CollectorConfig::default());
    harness.collector.run_at(UID, at(5, 12)).await.unwrap();

    harness.api.set(Mode::DeadlyAssault, deadly_assault_body(1001, 31500));
    let report = harness.collector.run_at(UID, at(6, 12)).await.unwrap();

    let Some(ModeOutcome::Collected(deadly)) = report.outcome(Mode::DeadlyAssault) else {
        panic!("deadly assault should be collected");
    };
    assert!(deadly.archive.is_written());

    let store = harness.store();
    assert_eq!(store.list_files(Mode::DeadlyAssault).unwrap().len(), 1);
    let archived = store.read_latest(Mode::DeadlyAssault).unwrap().unwrap();
    assert_eq!(archived.data.get("total_score"), Some(&json!(31500)));
    assert_eq!(archived.metadata.export_date, "2025-08-06T12:00:00.000Z");
}

#[tokio::test]
async fn test_void_front_is_always_written() {
    let config = CollectorConfig::default().with_modes([Mode::VoidFront]);
    let harness = Harness::new(all_modes_api(), config);

    harness.collector.run_at(UID, at(5, 12)).await.unwrap();
    let report = harness.collector.run_at(UID, at(6, 12)).await.unwrap();

    let Some(ModeOutcome::Collected(void_front)) = report.outcome(Mode::VoidFront) else {
        panic!("void front should be collected");
    };
    assert!(void_front.archive.is_written());
    assert!(void_front.window.is_unknown());
    assert_eq!(void_front.season_id.as_deref(), Some("7"));

    let mirror = void_front.mirror.as_ref().unwrap();
    assert!(mirror.ends_with("latest/void_front_1300000000_latest.json"));

    assert_eq!(harness.api.calls(), vec![Mode::VoidFront, Mode::VoidFront]);
}

#[tokio::test]
async fn test_shiyu_v2_is_normalized_before_archiving() {
    let config = CollectorConfig::default()
        .with_modes([Mode::ShiyuDefense])
        .with_naming(FileNaming::Window);
    let api = FakeApi::new().with(Mode::ShiyuDefense, shiyu_v2_body());
    let harness = Harness::new(api, config);

    let report = harness.collector.run_at(UID, at(5, 12)).await.unwrap();

    let Some(ModeOutcome::Collected(shiyu)) = report.outcome(Mode::ShiyuDefense) else {
        panic!("shiyu defense should be collected");
    };
    assert_eq!(shiyu.season_id.as_deref(), Some("61001"));
    assert_eq!(shiyu.window.start.as_deref(), Some("2025-08-01"));
    assert_eq!(shiyu.window.end.as_deref(), Some("2025-08-15"));
    assert!(shiyu
        .archive
        .path()
        .ends_with("shiyu-defense/shiyu-defense-2025-08-01-2025-08-15.json"));

    let stored = harness.store().read_artifact(shiyu.archive.path()).unwrap();
    let floors = stored.data["all_floor_detail"].as_array().unwrap();
    let layers: Vec<_> = floors.iter().map(|f| f["layer_index"].clone()).collect();
    assert_eq!(layers, vec![json!(6), json!(7), json!(7)]);
    assert_eq!(floors[0]["node_1"]["buddy"], json!({"id": 53001}));
    assert_eq!(stored.data["max_layer"], json!(7));
    assert_eq!(stored.data["fast_layer_time"], json!(312));
    assert_eq!(stored.data["rating_list"], json!([{"times": 1, "rating": "S"}]));
    assert!(stored.data.contains_key("hadal_info_v2"));
}

#[tokio::test]
async fn test_auth_failure_aborts_the_run() {
    let harness = Harness::build(all_modes_api(), CollectorConfig::default(), true);

    let err = harness.collector.run_at(UID, at(5, 12)).await.unwrap_err();

    assert!(matches!(err, CollectError::Auth(_)));
    assert!(harness.api.calls().is_empty());
    assert_eq!(harness.collector.state(), RunState::Idle);

    let events = harness.notifier.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[1], Event::AuthFailure(msg) if msg.contains("session expired")));

    for mode in Mode::ALL {
        assert!(harness.store().list_files(mode).unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_rate_limit_is_reported_once() {
    let api = all_modes_api()
        .with(Mode::DeadlyAssault, error_body(10101, "Visits too frequently"))
        .with(Mode::ShiyuDefense, error_body(10101, "Visits too frequently"));
    let harness = Harness::new(api, CollectorConfig::default());

    let report = harness.collector.run_at(UID, at(5, 12)).await.unwrap();

    assert!(report.rate_limited());
    assert_eq!(report.succeeded_modes(), vec![Mode::VoidFront]);

    let events = harness.notifier.events();
    assert_eq!(events.iter().filter(|e| **e == Event::RateLimited).count(), 1);
    assert!(!events.iter().any(|e| matches!(e, Event::ApiFailure(..))));
}

#[tokio::test]
async fn test_sequential_run_fetches_in_order() {
    let config = CollectorConfig::default().with_parallel(false);
    let harness = Harness::new(all_modes_api(), config);

    let report = harness.collector.run_at(UID, at(5, 12)).await.unwrap();

    assert_eq!(harness.api.calls(), Mode::ALL.to_vec());
    assert_eq!(report.succeeded_modes(), Mode::ALL.to_vec());
}

#[tokio::test]
async fn test_manual_run_is_marked_in_metadata() {
    let config = CollectorConfig::default()
        .with_modes([Mode::DeadlyAssault])
        .with_automated(false);
    let harness = Harness::new(all_modes_api(), config);

    harness.collector.run_at(UID, at(5, 12)).await.unwrap();

    let stored = harness.store().read_latest(Mode::DeadlyAssault).unwrap().unwrap();
    assert!(!stored.metadata.automated);
    assert_eq!(harness.api.calls(), vec![Mode::DeadlyAssault]);
}

#[tokio::test]
async fn test_state_transitions_are_observable() {
    let harness = Harness::new(all_modes_api(), CollectorConfig::default());
    let mut states = harness.collector.subscribe();

    harness.collector.run_at(UID, at(5, 12)).await.unwrap();

    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), RunState::Idle);
}
