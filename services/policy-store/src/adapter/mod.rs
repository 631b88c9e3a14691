//! Policy persistence adapter.
//!
//! # Purpose and responsibility
//! Translates between the enforcement engine's variable-arity policy tuples
//! and the fixed-width rows kept by a [`PolicyStore`]: bulk load, bulk save,
//! single-rule insert, and pattern-based deletion.
//!
//! # Key invariants and assumptions
//! - The adapter holds nothing but a store handle. Every call reads or writes
//!   the store directly; nothing is cached between calls.
//! - Codec and filter errors are raised before any store I/O.
//! - An empty removal pattern never reaches the store (see
//!   [`RemoveOutcome::EmptyFilterGuard`]).
//! - Saves append; callers wanting a full replace use [`PolicyAdapter::replace_all`]
//!   or call [`PolicyAdapter::clear`] first.
//! - Store errors are returned unchanged; there is no retry at this layer.
use crate::codec::{self, encode, encode_tuple};
use crate::error::{PolicyError, PolicyResult};
use crate::filter::build_filter;
use crate::model::{PolicyModel, PolicyRow, PolicyTuple};
use crate::observability::{EMPTY_FILTER_GUARD, ROWS_DELETED, ROWS_INSERTED, ROWS_LOADED};
use crate::store::PolicyStore;
use futures::future;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;

pub mod blocking;

/// Result of a filtered removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The filter was applied; this many rows were deleted.
    Removed(u64),
    /// The caller supplied no values, so nothing was sent to the store.
    EmptyFilterGuard,
}

impl RemoveOutcome {
    pub fn removed(&self) -> u64 {
        match self {
            RemoveOutcome::Removed(count) => *count,
            RemoveOutcome::EmptyFilterGuard => 0,
        }
    }
}

/// Async policy adapter over any [`PolicyStore`].
///
/// # Example
/// ```rust
/// use policy_store::adapter::PolicyAdapter;
/// use policy_store::store::memory::InMemoryStore;
/// use std::sync::Arc;
///
/// # async fn run() -> policy_store::error::PolicyResult<()> {
/// let adapter = PolicyAdapter::new(Arc::new(InMemoryStore::new()));
/// adapter.add_one("p", &["alice", "data1", "read"]).await?;
/// adapter.remove_filtered("p", 0, &["alice"]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PolicyAdapter {
    store: Arc<dyn PolicyStore>,
}

impl std::fmt::Debug for PolicyAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyAdapter")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

impl PolicyAdapter {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PolicyStore> {
        &self.store
    }

    /// Stream every stored rule, decoded.
    ///
    /// The stream is lazy and single-pass; calling `load_all` again starts a
    /// new read of the store. Rows without a type tag, or whose tag belongs to
    /// no model section, are skipped with a warning. An empty store yields an
    /// empty stream.
    pub fn load_all(&self) -> BoxStream<'_, PolicyResult<PolicyTuple>> {
        self.store
            .stream_rows()
            .map_err(PolicyError::from)
            .try_filter_map(|row| future::ready(Ok(routable(&row))))
            .inspect_ok(|_| metrics::counter!(ROWS_LOADED).increment(1))
            .boxed()
    }

    /// Load every stored rule into `model`. Returns the number of rules added.
    #[tracing::instrument(level = "debug", skip_all, fields(backend = self.store.backend_name()))]
    pub async fn load_policy(&self, model: &mut PolicyModel) -> PolicyResult<usize> {
        let mut tuples = self.load_all();
        let mut loaded = 0;
        while let Some(tuple) = tuples.try_next().await? {
            if model.add(tuple) {
                loaded += 1;
            }
        }
        tracing::debug!(loaded, "policy loaded");
        Ok(loaded)
    }

    /// Encode every tuple and insert them in a single bulk write.
    ///
    /// Nothing is cleared first, so saving the same tuples twice stores two
    /// copies. An empty input performs no store operation.
    #[tracing::instrument(level = "debug", skip_all, fields(tuples = tuples.len()))]
    pub async fn save_all(&self, tuples: &[PolicyTuple]) -> PolicyResult<u64> {
        if tuples.is_empty() {
            return Ok(0);
        }
        let rows = tuples
            .iter()
            .map(encode_tuple)
            .collect::<PolicyResult<Vec<_>>>()?;
        let inserted = self.store.insert_rows(rows).await?;
        metrics::counter!(ROWS_INSERTED).increment(inserted);
        tracing::debug!(inserted, "policy saved");
        Ok(inserted)
    }

    /// Save all `p` and `g` rules of `model`.
    pub async fn save_policy(&self, model: &PolicyModel) -> PolicyResult<u64> {
        self.save_all(&model.tuples()).await
    }

    /// Clear the store, then save `model`. The two steps are separate store
    /// operations; a failure in the save leaves the store empty.
    pub async fn replace_all(&self, model: &PolicyModel) -> PolicyResult<u64> {
        self.clear().await?;
        self.save_policy(model).await
    }

    /// Insert one rule and return the stored row.
    #[tracing::instrument(level = "debug", skip(self, rule), fields(arity = rule.len()))]
    pub async fn add_one<S: AsRef<str>>(&self, ptype: &str, rule: &[S]) -> PolicyResult<PolicyRow> {
        let row = encode(ptype, rule)?;
        let row = self.store.insert_row(row).await?;
        metrics::counter!(ROWS_INSERTED).increment(1);
        Ok(row)
    }

    /// Insert several rules of one tag as a single bulk write.
    #[tracing::instrument(level = "debug", skip(self, rules), fields(rules = rules.len()))]
    pub async fn add_many<R, S>(&self, ptype: &str, rules: &[R]) -> PolicyResult<u64>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        if rules.is_empty() {
            return Ok(0);
        }
        let rows = rules
            .iter()
            .map(|rule| encode(ptype, rule.as_ref()))
            .collect::<PolicyResult<Vec<_>>>()?;
        let inserted = self.store.insert_rows(rows).await?;
        metrics::counter!(ROWS_INSERTED).increment(inserted);
        Ok(inserted)
    }

    /// Delete rows of `ptype` whose fields equal `rule` position by position,
    /// starting at the first field.
    pub async fn remove<S: AsRef<str>>(&self, ptype: &str, rule: &[S]) -> PolicyResult<RemoveOutcome> {
        self.remove_filtered(ptype, 0, rule).await
    }

    /// Delete every row of `ptype` matching `values` from `field_index` on.
    ///
    /// Empty strings leave their position unconstrained. An empty `values`
    /// list deletes nothing and returns [`RemoveOutcome::EmptyFilterGuard`].
    #[tracing::instrument(level = "debug", skip(self, values), fields(values = values.len()))]
    pub async fn remove_filtered<S: AsRef<str>>(
        &self,
        ptype: &str,
        field_index: usize,
        values: &[S],
    ) -> PolicyResult<RemoveOutcome> {
        let Some(filter) = build_filter(ptype, field_index, values) else {
            metrics::counter!(EMPTY_FILTER_GUARD).increment(1);
            tracing::debug!("empty removal pattern, nothing deleted");
            return Ok(RemoveOutcome::EmptyFilterGuard);
        };
        let removed = self.store.delete_matching(&filter).await?;
        metrics::counter!(ROWS_DELETED).increment(removed);
        tracing::debug!(removed, constraints = filter.constraints.len(), "policy rows removed");
        Ok(RemoveOutcome::Removed(removed))
    }

    /// Delete every stored rule.
    pub async fn clear(&self) -> PolicyResult<u64> {
        let removed = self.store.clear().await?;
        metrics::counter!(ROWS_DELETED).increment(removed);
        tracing::debug!(removed, "policy store cleared");
        Ok(removed)
    }
}

fn routable(row: &PolicyRow) -> Option<PolicyTuple> {
    match codec::decode(row) {
        Ok(tuple) if tuple.section().is_some() => Some(tuple),
        Ok(tuple) => {
            tracing::warn!(id = ?row.id, ptype = %tuple.ptype, "skipping policy row with unknown section");
            None
        }
        Err(err) => {
            tracing::warn!(error = %err, "skipping malformed policy row");
            None
        }
    }
}
