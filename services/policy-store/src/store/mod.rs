//! Relational row stores for policy rules.
//!
//! # Purpose
//! [`PolicyStore`] is the seam between the policy adapter and a backend. The
//! adapter hands stores fully encoded rows and pre-built filters, so backends
//! never see variable-arity tuples.
//!
//! # Concurrency
//! Stores are shared across callers. Each call acquires what it needs (a
//! pooled connection or a lock) for the duration of that call only; there is
//! no cross-call atomicity.
use crate::config::{PolicyStoreConfig, StorageBackend};
use crate::filter::RowFilter;
use crate::model::PolicyRow;
use anyhow::Context;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Every stored row, read lazily. Each call starts a fresh read.
    fn stream_rows(&self) -> BoxStream<'_, StoreResult<PolicyRow>>;
    /// Insert all rows or none of them. Returns the number inserted.
    async fn insert_rows(&self, rows: Vec<PolicyRow>) -> StoreResult<u64>;
    /// Insert one row and return it with its assigned id.
    async fn insert_row(&self, row: PolicyRow) -> StoreResult<PolicyRow>;
    /// Delete every row matching `filter`. Returns the number deleted.
    async fn delete_matching(&self, filter: &RowFilter) -> StoreResult<u64>;
    /// Delete every row. Returns the number deleted.
    async fn clear(&self) -> StoreResult<u64>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

/// Open the backend selected by `config`.
pub async fn connect(config: &PolicyStoreConfig) -> anyhow::Result<Arc<dyn PolicyStore>> {
    let store: Arc<dyn PolicyStore> = match config.storage {
        StorageBackend::Memory => Arc::new(memory::InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(postgres::PostgresStore::connect(pg, config.run_migrations).await?)
        }
    };
    tracing::info!(backend = store.backend_name(), "policy store ready");
    Ok(store)
}
