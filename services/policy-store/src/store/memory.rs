//! In-memory implementation of the policy store.
//!
//! # Purpose
//! Keeps rows in a `Vec` guarded by `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all rows are lost on process restart.
//! - Each call takes the lock once, so a bulk insert or a filtered delete is
//!   applied as a unit with respect to other callers.
//! - Ids are assigned from a process-local counter that starts at 1 and never
//!   goes backwards, including across `clear()`.
use super::{PolicyStore, StoreResult};
use crate::filter::RowFilter;
use crate::model::PolicyRow;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Rows {
    next_id: i32,
    items: Vec<PolicyRow>,
}

impl Rows {
    fn assign(&mut self, mut row: PolicyRow) -> PolicyRow {
        self.next_id += 1;
        row.id = Some(self.next_id);
        self.items.push(row.clone());
        row
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    rows: Arc<RwLock<Rows>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row exactly as given, bypassing the codec. Used to seed
    /// hand-built rows (including malformed ones) in tests.
    pub async fn insert_raw(&self, row: PolicyRow) -> PolicyRow {
        self.rows.write().await.assign(row)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PolicyStore for InMemoryStore {
    fn stream_rows(&self) -> BoxStream<'_, StoreResult<PolicyRow>> {
        let rows = Arc::clone(&self.rows);
        stream::once(async move { rows.read().await.items.clone() })
            .flat_map(|items| stream::iter(items.into_iter().map(Ok)))
            .boxed()
    }

    async fn insert_rows(&self, rows: Vec<PolicyRow>) -> StoreResult<u64> {
        let mut guard = self.rows.write().await;
        let count = rows.len() as u64;
        for row in rows {
            guard.assign(row);
        }
        Ok(count)
    }

    async fn insert_row(&self, row: PolicyRow) -> StoreResult<PolicyRow> {
        Ok(self.rows.write().await.assign(row))
    }

    async fn delete_matching(&self, filter: &RowFilter) -> StoreResult<u64> {
        let mut guard = self.rows.write().await;
        let before = guard.items.len();
        guard.items.retain(|row| !filter.matches(row));
        Ok((before - guard.items.len()) as u64)
    }

    async fn clear(&self) -> StoreResult<u64> {
        let mut guard = self.rows.write().await;
        let removed = guard.items.len() as u64;
        guard.items.clear();
        Ok(removed)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
