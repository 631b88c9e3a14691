#![allow(dead_code)]

use futures::TryStreamExt;
use policy_store::{PolicyAdapter, PolicyTuple, RemoveOutcome};

pub async fn load(adapter: &PolicyAdapter) -> Vec<PolicyTuple> {
    let mut tuples: Vec<PolicyTuple> = adapter.load_all().try_collect().await.expect("load");
    tuples.sort_by(|a, b| (&a.ptype, &a.rule).cmp(&(&b.ptype, &b.rule)));
    tuples
}

pub fn tuple(ptype: &str, rule: &[&str]) -> PolicyTuple {
    PolicyTuple::new(ptype, rule.iter().copied())
}

pub async fn add_load_remove_filtered(adapter: &PolicyAdapter) {
    adapter
        .add_one("p", &["alice", "data1", "read"])
        .await
        .expect("add alice");
    adapter
        .add_one("p", &["bob", "data2", "write"])
        .await
        .expect("add bob");

    assert_eq!(
        load(adapter).await,
        vec![
            tuple("p", &["alice", "data1", "read"]),
            tuple("p", &["bob", "data2", "write"]),
        ]
    );

    let outcome = adapter
        .remove_filtered("p", 0, &["alice"])
        .await
        .expect("remove alice");
    assert_eq!(outcome, RemoveOutcome::Removed(1));
    assert_eq!(load(adapter).await, vec![tuple("p", &["bob", "data2", "write"])]);
}

pub async fn save_all_appends_duplicates(adapter: &PolicyAdapter) {
    let tuples = vec![
        tuple("p", &["alice", "data1", "read"]),
        tuple("g", &["alice", "admin"]),
    ];
    assert_eq!(adapter.save_all(&tuples).await.expect("save"), 2);
    assert_eq!(adapter.save_all(&tuples).await.expect("save again"), 2);
    assert_eq!(load(adapter).await.len(), 4);

    let outcome = adapter
        .remove("g", &["alice", "admin"])
        .await
        .expect("remove grouping");
    assert_eq!(outcome, RemoveOutcome::Removed(2));
    assert_eq!(load(adapter).await.len(), 2);
}

pub async fn filter_window_and_guard(adapter: &PolicyAdapter) {
    adapter
        .add_many::<Vec<&str>, &str>(
            "p",
            &[
                vec!["alice", "data1", "read"],
                vec!["alice", "data2", "read"],
                vec!["bob", "data1", "write"],
            ],
        )
        .await
        .expect("add many");

    let guard = adapter
        .remove_filtered::<&str>("p", 0, &[])
        .await
        .expect("guard");
    assert_eq!(guard, RemoveOutcome::EmptyFilterGuard);
    assert_eq!(load(adapter).await.len(), 3);

    // Offset window: match on the second field only.
    let outcome = adapter
        .remove_filtered("p", 1, &["data1"])
        .await
        .expect("remove data1");
    assert_eq!(outcome.removed(), 2);
    assert_eq!(load(adapter).await, vec![tuple("p", &["alice", "data2", "read"])]);

    // Empty strings leave their position unconstrained.
    let outcome = adapter
        .remove_filtered("p", 0, &["", "", "read"])
        .await
        .expect("remove read");
    assert_eq!(outcome.removed(), 1);
    assert!(load(adapter).await.is_empty());
}

pub async fn ptype_scopes_removal(adapter: &PolicyAdapter) {
    adapter.add_one("p", &["alice", "admin"]).await.expect("add p");
    adapter.add_one("g", &["alice", "admin"]).await.expect("add g");

    let outcome = adapter.remove("p", &["alice"]).await.expect("remove p");
    assert_eq!(outcome.removed(), 1);
    assert_eq!(load(adapter).await, vec![tuple("g", &["alice", "admin"])]);
}

pub async fn six_field_rules_round_trip(adapter: &PolicyAdapter) {
    let rule = ["alice", "tenant1", "data1", "read", "allow", "2024"];
    let row = adapter.add_one("p", &rule).await.expect("add six");
    assert!(row.id.is_some());
    assert_eq!(load(adapter).await, vec![tuple("p", &rule)]);

    let err = adapter
        .add_one("p", &["a", "b", "c", "d", "e", "f", "g"])
        .await
        .expect_err("seven fields");
    assert!(matches!(err, policy_store::PolicyError::ArityExceeded { len: 7, .. }));
    assert_eq!(load(adapter).await.len(), 1);
}
