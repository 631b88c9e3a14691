//! Blocking form of the policy adapter.
//!
//! Each call drives the async [`PolicyAdapter`] to completion on a
//! current-thread runtime owned by this adapter, so calls from one thread run
//! strictly in the order they are made. Do not call these methods from inside
//! an async runtime; `block_on` panics there.
//!
//! Stores that hold runtime-bound resources (the Postgres pool) must be
//! created on this adapter's runtime; use [`BlockingPolicyAdapter::connect`].
use super::{PolicyAdapter, RemoveOutcome};
use crate::config::PolicyStoreConfig;
use crate::error::PolicyResult;
use crate::model::{PolicyModel, PolicyRow, PolicyTuple};
use crate::store::{self, PolicyStore};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

#[derive(Debug)]
pub struct BlockingPolicyAdapter {
    runtime: Runtime,
    inner: PolicyAdapter,
}

fn runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

impl BlockingPolicyAdapter {
    /// Wrap an existing store. Suitable for runtime-agnostic stores such as
    /// [`crate::store::memory::InMemoryStore`].
    pub fn new(store: Arc<dyn PolicyStore>) -> std::io::Result<Self> {
        Ok(Self {
            runtime: runtime()?,
            inner: PolicyAdapter::new(store),
        })
    }

    /// Open the configured store on this adapter's runtime.
    pub fn connect(config: &PolicyStoreConfig) -> anyhow::Result<Self> {
        let runtime = runtime()?;
        let store = runtime.block_on(store::connect(config))?;
        Ok(Self {
            runtime,
            inner: PolicyAdapter::new(store),
        })
    }

    pub fn as_async(&self) -> &PolicyAdapter {
        &self.inner
    }

    /// Read every stored rule. Each call re-reads the store.
    pub fn load_all(&self) -> PolicyResult<Vec<PolicyTuple>> {
        self.runtime.block_on(self.inner.load_all().try_collect())
    }

    pub fn load_policy(&self, model: &mut PolicyModel) -> PolicyResult<usize> {
        self.runtime.block_on(self.inner.load_policy(model))
    }

    pub fn save_all(&self, tuples: &[PolicyTuple]) -> PolicyResult<u64> {
        self.runtime.block_on(self.inner.save_all(tuples))
    }

    pub fn save_policy(&self, model: &PolicyModel) -> PolicyResult<u64> {
        self.runtime.block_on(self.inner.save_policy(model))
    }

    pub fn replace_all(&self, model: &PolicyModel) -> PolicyResult<u64> {
        self.runtime.block_on(self.inner.replace_all(model))
    }

    pub fn add_one<S: AsRef<str>>(&self, ptype: &str, rule: &[S]) -> PolicyResult<PolicyRow> {
        self.runtime.block_on(self.inner.add_one(ptype, rule))
    }

    pub fn add_many<R, S>(&self, ptype: &str, rules: &[R]) -> PolicyResult<u64>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.runtime.block_on(self.inner.add_many(ptype, rules))
    }

    pub fn remove<S: AsRef<str>>(&self, ptype: &str, rule: &[S]) -> PolicyResult<RemoveOutcome> {
        self.runtime.block_on(self.inner.remove(ptype, rule))
    }

    pub fn remove_filtered<S: AsRef<str>>(
        &self,
        ptype: &str,
        field_index: usize,
        values: &[S],
    ) -> PolicyResult<RemoveOutcome> {
        self.runtime
            .block_on(self.inner.remove_filtered(ptype, field_index, values))
    }

    pub fn clear(&self) -> PolicyResult<u64> {
        self.runtime.block_on(self.inner.clear())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use crate::store::memory::InMemoryStore;

    fn adapter() -> BlockingPolicyAdapter {
        BlockingPolicyAdapter::new(Arc::new(InMemoryStore::new())).expect("runtime")
    }

    #[test]
    fn blocking_calls_mirror_async_semantics() {
        let adapter = adapter();
        adapter.add_one("p", &["alice", "data1", "read"]).expect("add");
        adapter.add_one("p", &["bob", "data2", "write"]).expect("add");

        let loaded = adapter.load_all().expect("load");
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains(&PolicyTuple::new("p", ["alice", "data1", "read"])));

        assert_eq!(
            adapter.remove_filtered("p", 0, &["alice"]).expect("remove"),
            RemoveOutcome::Removed(1)
        );
        assert_eq!(
            adapter.remove_filtered::<&str>("p", 0, &[]).expect("remove"),
            RemoveOutcome::EmptyFilterGuard
        );
        assert_eq!(
            adapter.load_all().expect("load"),
            vec![PolicyTuple::new("p", ["bob", "data2", "write"])]
        );
    }

    #[test]
    fn blocking_model_round_trip() {
        let adapter = adapter();
        let model: PolicyModel = vec![
            PolicyTuple::new("p", ["admin", "data1", "read"]),
            PolicyTuple::new("g", ["alice", "admin"]),
        ]
        .into_iter()
        .collect();
        assert_eq!(adapter.save_policy(&model).expect("save"), 2);
        assert_eq!(
            adapter
                .add_many::<[&str; 2], &str>("g", &[["bob", "admin"]])
                .expect("add"),
            1
        );

        let mut reloaded = PolicyModel::new();
        assert_eq!(adapter.load_policy(&mut reloaded).expect("load"), 3);
        assert_eq!(reloaded.rules("g", "g").len(), 2);

        assert_eq!(adapter.replace_all(&model).expect("replace"), 2);
        assert_eq!(adapter.load_all().expect("load").len(), 2);
        assert_eq!(adapter.clear().expect("clear"), 2);
        assert!(adapter.load_all().expect("load").is_empty());
    }

    #[test]
    fn connect_opens_memory_backend() {
        let config = PolicyStoreConfig {
            storage: StorageBackend::Memory,
            postgres: None,
            run_migrations: false,
            seed_file: None,
        };
        let adapter = BlockingPolicyAdapter::connect(&config).expect("connect");
        assert_eq!(adapter.as_async().store().backend_name(), "memory");
        assert_eq!(
            adapter.remove("p", &["nobody"]).expect("remove"),
            RemoveOutcome::Removed(0)
        );
    }
}
