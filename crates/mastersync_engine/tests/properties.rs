//! Property tests over whole rounds.

use mastersync_engine::{LogicalGroup, MockTransport, SyncConfig, SyncOrchestrator, SyncPlan};
use mastersync_storage::{EntityStore, MemorySchemaStore, StoreSet};
use mastersync_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn orchestrator(plan: SyncPlan, stores: StoreSet) -> SyncOrchestrator {
    SyncOrchestrator::new(
        SyncConfig::default().with_plan(plan),
        test_cipher(),
        stores,
        Arc::new(MemorySchemaStore::new()),
        Arc::new(MockTransport::new()),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn rounds_are_idempotent(
        languages in language_records_strategy(12),
        reasons in reason_records_strategy(12),
    ) {
        let plan = SyncPlan::new(vec![
            LogicalGroup::fixed("languages", &["Language"]),
            LogicalGroup::fixed("reasons", &["ReasonList"]),
        ]);
        let stores = StoreSet::in_memory(["Language", "ReasonList"]);
        let orch = orchestrator(plan, stores.clone());
        let batch = BatchBuilder::new()
            .fixed("Language", &languages)
            .fixed("ReasonList", &reasons)
            .build();

        prop_assert!(orch.sync_all(&batch).is_success());
        let language_rows = stores.get("Language").unwrap().all().unwrap();
        let reason_rows = stores.get("ReasonList").unwrap().all().unwrap();

        prop_assert!(orch.sync_all(&batch).is_success());
        prop_assert_eq!(&stores.get("Language").unwrap().all().unwrap(), &language_rows);
        prop_assert_eq!(&stores.get("ReasonList").unwrap().all().unwrap(), &reason_rows);
        prop_assert_eq!(language_rows.len(), languages.len());
    }

    #[test]
    fn incoming_name_replaces_every_spelling(
        old in dynamic_records_strategy("religion", 6),
        new in dynamic_records_strategy("religion", 6),
    ) {
        let plan = SyncPlan::new(vec![LogicalGroup::dynamic("dynamic-field")]);
        let stores = StoreSet::in_memory(["DynamicField"]);
        let orch = orchestrator(plan, stores.clone());

        // distinct ids so survivors can be told apart
        let old: Vec<_> = old
            .into_iter()
            .map(|mut r| {
                let id = format!("old-{}", r["id"].as_str().unwrap());
                r["id"] = id.into();
                r
            })
            .collect();

        prop_assert!(orch.sync_all(&BatchBuilder::new().dynamic("religion", &old).build()).is_success());
        prop_assert!(orch.sync_all(&BatchBuilder::new().dynamic("religion", &new).build()).is_success());

        let rows = stores.get("DynamicField").unwrap().all().unwrap();
        prop_assert_eq!(rows.len(), new.len());
        prop_assert!(rows.iter().all(|e| !e.key.to_string().starts_with("old-")));
    }
}
