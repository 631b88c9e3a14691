mod common;

use policy_store::store::memory::InMemoryStore;
use policy_store::{BlockingPolicyAdapter, PolicyAdapter, PolicyModel, PolicyRow};
use std::sync::Arc;

fn adapter() -> PolicyAdapter {
    PolicyAdapter::new(Arc::new(InMemoryStore::new()))
}

#[tokio::test]
async fn add_load_remove_filtered() {
    common::add_load_remove_filtered(&adapter()).await;
}

#[tokio::test]
async fn save_all_appends_duplicates() {
    common::save_all_appends_duplicates(&adapter()).await;
}

#[tokio::test]
async fn filter_window_and_guard() {
    common::filter_window_and_guard(&adapter()).await;
}

#[tokio::test]
async fn ptype_scopes_removal() {
    common::ptype_scopes_removal(&adapter()).await;
}

#[tokio::test]
async fn six_field_rules_round_trip() {
    common::six_field_rules_round_trip(&adapter()).await;
}

#[tokio::test]
async fn malformed_rows_are_skipped_on_load() {
    let store = InMemoryStore::new();
    store
        .insert_raw(PolicyRow {
            id: None,
            ptype: None,
            fields: [Some("orphan".to_string()), None, None, None, None, None],
        })
        .await;
    let adapter = PolicyAdapter::new(Arc::new(store.clone()));
    adapter.add_one("p", &["alice", "data1", "read"]).await.expect("add");

    let mut model = PolicyModel::new();
    let loaded = adapter.load_policy(&mut model).await.expect("load");
    assert_eq!(loaded, 1);
    assert_eq!(model.rules("p", "p"), &[vec!["alice", "data1", "read"]]);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn loaded_model_drives_enforcer() {
    use casbin::CoreApi;

    let adapter = adapter();
    adapter.add_one("p", &["admin", "data1", "read"]).await.expect("add p");
    adapter.add_one("g", &["alice", "admin"]).await.expect("add g");

    let mut model = PolicyModel::new();
    adapter.load_policy(&mut model).await.expect("load");
    let enforcer = policy_store::rbac::enforcer::build_enforcer(&model)
        .await
        .expect("enforcer");
    assert!(enforcer.enforce(("alice", "data1", "read")).expect("enforce"));
    assert!(!enforcer.enforce(("bob", "data1", "read")).expect("enforce"));
}

#[test]
fn blocking_adapter_matches_async_behavior() {
    let adapter =
        BlockingPolicyAdapter::new(Arc::new(InMemoryStore::new())).expect("blocking adapter");
    adapter.add_one("p", &["alice", "data1", "read"]).expect("add");
    adapter.add_one("p", &["bob", "data2", "write"]).expect("add");

    let outcome = adapter.remove_filtered("p", 0, &["alice"]).expect("remove");
    assert_eq!(outcome.removed(), 1);
    let loaded = adapter.load_all().expect("load");
    assert_eq!(loaded, vec![common::tuple("p", &["bob", "data2", "write"])]);
}
