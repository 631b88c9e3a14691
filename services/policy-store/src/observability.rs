//! Observability wiring for the policy store.
//!
//! # Purpose
//! Installs a `tracing` subscriber with an `EnvFilter` (default `info`) and
//! names the `metrics` counters emitted by the adapter. No exporter is
//! installed here; embedding services install their own recorder.
//!
//! # Notes
//! Initialization is guarded by `OnceLock` to keep startup idempotent in tests.
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const ROWS_LOADED: &str = "policy_store_rows_loaded_total";
pub const ROWS_INSERTED: &str = "policy_store_rows_inserted_total";
pub const ROWS_DELETED: &str = "policy_store_rows_deleted_total";
pub const EMPTY_FILTER_GUARD: &str = "policy_store_empty_filter_guard_total";

static OBS_INIT: OnceLock<()> = OnceLock::new();

pub fn init_observability(service_name: &str) {
    OBS_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
        tracing::debug!(service = service_name, "observability initialized");
    });
}
