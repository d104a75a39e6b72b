//! End-to-end rounds against instrumented stores.

use mastersync_codec::DecodeError;
use mastersync_core::{CoreError, EntityKey};
use mastersync_engine::{
    GroupKind, LogicalGroup, MockTransport, SyncConfig, SyncError, SyncOrchestrator, SyncPlan,
    SyncVerdict, TaskState, DYNAMIC_FIELD_STORE,
};
use mastersync_protocol::{BatchRequest, SyncBatch};
use mastersync_storage::{
    EntityStore, MemorySchemaStore, SchemaStore, StoreSet,
};
use mastersync_testkit::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn plan_categories(plan: &SyncPlan) -> Vec<String> {
    plan.store_categories()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn fixed_categories() -> Vec<String> {
    SyncPlan::standard()
        .fixed_categories()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn reachable_transport() -> Arc<MockTransport> {
    let transport = Arc::new(MockTransport::new());
    transport.set_schema(schema_document(1.0));
    transport
}

fn orchestrator(
    config: SyncConfig,
    stores: StoreSet,
    schema_store: Arc<dyn SchemaStore>,
    transport: Arc<MockTransport>,
) -> SyncOrchestrator {
    SyncOrchestrator::new(config, test_cipher(), stores, schema_store, transport)
}

fn standard_recording() -> (StoreSet, BTreeMap<String, Arc<RecordingStore>>) {
    let categories = plan_categories(&SyncPlan::standard());
    recording_set(categories.iter().map(String::as_str))
}

fn standard_batch() -> SyncBatch {
    let categories = fixed_categories();
    full_batch(categories.iter().map(String::as_str))
}

#[test]
fn well_formed_batch_writes_every_store_once() {
    let (stores, recorded) = standard_recording();
    let schema_store = Arc::new(MemorySchemaStore::new());
    let orch = orchestrator(
        SyncConfig::default(),
        stores,
        schema_store.clone(),
        reachable_transport(),
    );

    let report = orch.run_round(&standard_batch());

    assert!(report.verdict.is_success(), "{:?}", report.verdict);
    for category in fixed_categories() {
        assert_eq!(recorded[&category].upsert_sizes(), vec![2], "{category}");
    }
    assert_eq!(recorded[DYNAMIC_FIELD_STORE].upsert_sizes(), vec![3]);
    assert_eq!(schema_store.identity_schema_count(), 1);
    assert_eq!(schema_store.process_spec_count(), 2);
    assert!(orch
        .group_states()
        .iter()
        .all(|(_, state)| *state == TaskState::Completed));
    assert_eq!(report.groups.iter().map(|g| g.entities).sum::<usize>(), 60 + 3 + 3);
}

#[test]
fn malformed_machine_payload_fails_only_its_unit() {
    let (stores, recorded) = standard_recording();
    let categories = fixed_categories();
    let batch = categories
        .iter()
        .fold(BatchBuilder::new(), |builder, category| {
            if category == "Machine" {
                builder.fixed_raw(category, Some("%%% not base64 %%%"))
            } else {
                builder.sample(category)
            }
        })
        .build();
    let orch = orchestrator(
        SyncConfig::default(),
        stores,
        Arc::new(MemorySchemaStore::new()),
        reachable_transport(),
    );

    let verdict = orch.sync_all(&batch);

    let causes = verdict.causes();
    assert_eq!(causes.len(), 1);
    assert_eq!(causes[0].group, "machine");
    assert_eq!(causes[0].category, "Machine");
    assert!(matches!(
        causes[0].cause,
        SyncError::Decode(DecodeError::MalformedPayload { .. })
    ));

    assert_eq!(recorded["MachineType"].len().unwrap(), 2);
    assert_eq!(recorded["MachineSpecification"].len().unwrap(), 2);
    assert_eq!(recorded["Machine"].upsert_calls(), 0);
    for category in categories.iter().filter(|c| !c.starts_with("Machine")) {
        assert_eq!(recorded[category].upsert_calls(), 1, "{category}");
    }

    let err = verdict.into_result().unwrap_err();
    assert!(err.to_string().starts_with("MASTER_SYNC_EXCEPTION (1 failed unit(s))"));
}

#[test]
fn identical_rounds_are_idempotent() {
    let temp = TempStoreDir::new();
    let categories = plan_categories(&SyncPlan::standard());
    let stores = temp.store_set(categories.iter().map(String::as_str));
    let orch = orchestrator(
        SyncConfig::default(),
        stores.clone(),
        Arc::new(MemorySchemaStore::new()),
        reachable_transport(),
    );
    let batch = standard_batch();

    assert!(orch.sync_all(&batch).is_success());
    let first: Vec<_> = categories
        .iter()
        .map(|c| stores.get(c).unwrap().all().unwrap())
        .collect();

    assert!(orch.sync_all(&batch).is_success());
    let second: Vec<_> = categories
        .iter()
        .map(|c| stores.get(c).unwrap().all().unwrap())
        .collect();

    assert_eq!(first, second);
    assert_eq!(orch.stats().rounds_succeeded, 2);
}

#[test]
fn empty_payloads_complete_with_zero_entities() {
    let (stores, recorded) = standard_recording();
    let orch = orchestrator(
        SyncConfig::default(),
        stores,
        Arc::new(MemorySchemaStore::new()),
        reachable_transport(),
    );
    let batch = BatchBuilder::new()
        .fixed_raw("Language", None)
        .fixed_raw("ReasonList", Some(""))
        .build();

    let report = orch.run_round(&batch);

    assert!(report.verdict.is_success());
    assert_eq!(recorded["Language"].upsert_sizes(), vec![0]);
    assert_eq!(recorded["ReasonList"].upsert_sizes(), vec![0]);
    assert_eq!(recorded["Machine"].upsert_sizes(), vec![0]);
    assert_eq!(recorded[DYNAMIC_FIELD_STORE].upsert_calls(), 0);
}

#[test]
fn unknown_category_fails_after_fallback_succeeds() {
    let plan = SyncPlan::new(vec![LogicalGroup::fixed(
        "custom",
        &["ProcessList", "Spaceship", "Language"],
    )]);
    let (stores, recorded) = recording_set(["ProcessList", "Spaceship", "Language"]);
    let orch = orchestrator(
        SyncConfig::default().with_plan(plan),
        stores,
        Arc::new(MemorySchemaStore::new()),
        reachable_transport(),
    );
    let batch = BatchBuilder::new()
        .sample("ProcessList")
        .sample("Spaceship")
        .sample("Language")
        .build();

    let verdict = orch.sync_all(&batch);

    assert_eq!(verdict.causes().len(), 1);
    assert_eq!(verdict.causes()[0].category, "Spaceship");
    assert!(matches!(
        verdict.causes()[0].cause,
        SyncError::Core(CoreError::UnknownCategory { .. })
    ));
    assert_eq!(recorded["ProcessList"].len().unwrap(), 2);
    assert_eq!(recorded["Spaceship"].upsert_calls(), 0);
    assert_eq!(recorded["Language"].upsert_calls(), 0);
}

#[test]
fn dynamic_duplicates_resolved_ignoring_case() {
    let plan = SyncPlan::new(vec![LogicalGroup::dynamic("dynamic-field")]);
    let (stores, recorded) = recording_set([DYNAMIC_FIELD_STORE]);
    let store = &recorded[DYNAMIC_FIELD_STORE];
    let orch = orchestrator(
        SyncConfig::default().with_plan(plan.clone()),
        stores,
        Arc::new(MemorySchemaStore::new()),
        reachable_transport(),
    );

    let first = BatchBuilder::new()
        .dynamic("Religion", &dynamic_records("Religion", &["eng", "fra"]))
        .build();
    assert!(orch.sync_all(&first).is_success());
    assert_eq!(store.len().unwrap(), 2);

    let second = BatchBuilder::new()
        .dynamic("religion", &dynamic_records("religion", &["eng"]))
        .build();
    assert!(orch.sync_all(&second).is_success());

    assert_eq!(store.deleted(), 2);
    assert_eq!(store.len().unwrap(), 1);
    assert!(store.get(&EntityKey::new(["religion-eng"])).unwrap().is_some());
    assert!(store.get(&EntityKey::new(["Religion-fra"])).unwrap().is_none());

    // without resolution both spellings survive
    let (stores, recorded) = recording_set([DYNAMIC_FIELD_STORE]);
    let orch = orchestrator(
        SyncConfig::default()
            .with_plan(plan)
            .with_dynamic_duplicate_resolution(false),
        stores,
        Arc::new(MemorySchemaStore::new()),
        reachable_transport(),
    );
    orch.sync_all(&first);
    orch.sync_all(&second);
    assert_eq!(recorded[DYNAMIC_FIELD_STORE].len().unwrap(), 3);
}

#[test]
fn unreachable_schema_sync_makes_no_calls() {
    let (stores, recorded) = standard_recording();
    let schema_store = Arc::new(MemorySchemaStore::new());
    let transport = reachable_transport();
    transport.set_reachable(false);
    let orch = orchestrator(
        SyncConfig::default(),
        stores,
        schema_store.clone(),
        transport.clone(),
    );

    let verdict = orch.sync_all(&standard_batch());

    assert_eq!(verdict.causes().len(), 1);
    assert_eq!(verdict.causes()[0].group, "schema");
    assert!(matches!(verdict.causes()[0].cause, SyncError::NoNetwork));
    assert_eq!(transport.schema_calls(), 0);
    assert_eq!(transport.fetch_calls(), 0);
    assert_eq!(schema_store.identity_schema_count(), 0);
    assert_eq!(recorded["Language"].upsert_calls(), 1);

    let states = orch.group_states();
    assert_eq!(states.last().unwrap(), &("schema".to_string(), TaskState::Failed));
}

#[test]
fn all_units_run_concurrently() {
    let plan = SyncPlan::standard();
    let rendezvous = Rendezvous::new(plan.groups().len());
    let mut stores = StoreSet::new();
    let mut gated = Vec::new();
    let mut recorded = Vec::new();

    for group in plan.groups() {
        for (index, category) in group.store_categories().into_iter().enumerate() {
            let recording = Arc::new(RecordingStore::new(category));
            recorded.push(recording.clone());
            if index == 0 {
                let store = Arc::new(RendezvousStore::new(recording, rendezvous.clone()));
                gated.push(store.clone());
                stores.insert(category, store);
            } else {
                stores.insert(category, recording);
            }
        }
    }
    let schema_store = Arc::new(RendezvousSchemaStore::new(rendezvous.clone()));
    let orch = orchestrator(
        SyncConfig::default(),
        stores,
        schema_store.clone(),
        reachable_transport(),
    );

    let verdict = orch.sync_all(&standard_batch());

    assert!(verdict.is_success(), "{verdict:?}");
    assert_eq!(gated.len(), 10);
    assert!(gated.iter().all(|s| s.met_everyone()));
    assert!(schema_store.met_everyone());
    assert!(rendezvous.is_complete());
    assert!(recorded.iter().all(|s| s.upsert_calls() == 1));
}

#[test]
fn finished_groups_report_final_state_while_others_run() {
    let plan = SyncPlan::new(vec![
        LogicalGroup::fixed("held", &["Language"]),
        LogicalGroup::fixed("quick", &["ReasonList"]),
    ]);
    let gate = Rendezvous::new(2);
    let held = Arc::new(RendezvousStore::new(
        Arc::new(RecordingStore::new("Language")),
        gate.clone(),
    ));
    let stores = StoreSet::new()
        .with_store("Language", held.clone())
        .with_store("ReasonList", Arc::new(RecordingStore::new("ReasonList")));
    let orch = orchestrator(
        SyncConfig::default().with_plan(plan),
        stores,
        Arc::new(MemorySchemaStore::new()),
        reachable_transport(),
    );
    let batch = full_batch(["Language", "ReasonList"]);

    let (during, verdict) = std::thread::scope(|scope| {
        let round = scope.spawn(|| orch.sync_all(&batch));
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut states = orch.group_states();
        let settled = |states: &[(String, TaskState)]| {
            states[0].1 == TaskState::Running && states[1].1 == TaskState::Completed
        };
        while !settled(&states) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
            states = orch.group_states();
        }
        gate.arrive();
        (states, round.join().unwrap())
    });

    assert_eq!(during[0], ("held".to_string(), TaskState::Running));
    assert_eq!(during[1], ("quick".to_string(), TaskState::Completed));
    assert!(verdict.is_success(), "{verdict:?}");
    assert!(held.met_everyone());
    assert!(orch
        .group_states()
        .iter()
        .all(|(_, state)| *state == TaskState::Completed));
}

#[test]
fn panicking_unit_is_reported_not_propagated() {
    let plan = SyncPlan::new(vec![
        LogicalGroup::fixed("boom", &["Language"]),
        LogicalGroup::fixed("steady", &["ReasonList"]),
    ]);
    let steady = Arc::new(RecordingStore::new("ReasonList"));
    let stores = StoreSet::new()
        .with_store("Language", Arc::new(PanickingStore::new("Language")))
        .with_store("ReasonList", steady.clone());
    let orch = orchestrator(
        SyncConfig::default().with_plan(plan),
        stores,
        Arc::new(MemorySchemaStore::new()),
        reachable_transport(),
    );

    let verdict = orch.sync_all(&BatchBuilder::new().sample("ReasonList").build());

    match &verdict {
        SyncVerdict::Failure { causes } => {
            assert_eq!(causes.len(), 1);
            assert!(matches!(
                &causes[0].cause,
                SyncError::TaskPanicked { group, message }
                    if group == "boom" && message.contains("exploded")
            ));
        }
        SyncVerdict::Success => panic!("panic was swallowed"),
    }
    assert_eq!(steady.len().unwrap(), 2);
    assert_eq!(
        orch.group_states(),
        vec![
            ("boom".to_string(), TaskState::Failed),
            ("steady".to_string(), TaskState::Completed),
        ]
    );
}

#[test]
fn storage_failure_is_a_cause() {
    let (stores, recorded) = standard_recording();
    recorded["Template"].fail_upserts("disk full");
    let orch = orchestrator(
        SyncConfig::default(),
        stores,
        Arc::new(MemorySchemaStore::new()),
        reachable_transport(),
    );

    let verdict = orch.sync_all(&standard_batch());

    assert_eq!(verdict.causes().len(), 1);
    assert_eq!(verdict.causes()[0].group, "template");
    assert!(matches!(verdict.causes()[0].cause, SyncError::Storage(_)));
    assert_eq!(recorded["TemplateType"].len().unwrap(), 2);
}

#[test]
fn fetch_and_sync_uses_transport() {
    let (stores, recorded) = standard_recording();
    let transport = reachable_transport();
    transport.set_batch(standard_batch());
    let orch = orchestrator(
        SyncConfig::default(),
        stores,
        Arc::new(MemorySchemaStore::new()),
        transport.clone(),
    );

    let verdict = orch
        .fetch_and_sync(&BatchRequest::new("key-1").with_last_updated("2024-01-01T00:00:00Z"))
        .unwrap();
    assert!(verdict.is_success());
    assert_eq!(transport.fetch_calls(), 1);

    transport.fail_fetch("connection reset");
    let err = orch.fetch_and_sync(&BatchRequest::new("key-1")).unwrap_err();
    assert!(matches!(err, SyncError::Network { retryable: true, .. }));
    assert_eq!(recorded["Language"].upsert_calls(), 1);
}

#[test]
fn standard_plan_only_schema_group_has_no_stores() {
    let plan = SyncPlan::standard();
    let schema_groups: Vec<_> = plan
        .groups()
        .iter()
        .filter(|g| g.store_categories().is_empty())
        .collect();
    assert_eq!(schema_groups.len(), 1);
    assert_eq!(schema_groups[0].kind, GroupKind::Schema);
}
