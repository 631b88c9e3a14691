//! Policy store entry point.
//!
//! Connects the configured backend, seeds it when asked, then loads every
//! rule into an enforcer to confirm the stored policy is usable.
use anyhow::Context;
use casbin::MgmtApi;
use policy_store::config::PolicyStoreConfig;
use policy_store::{PolicyAdapter, PolicyModel, observability, rbac, seed, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_observability("policy-store");
    let config = PolicyStoreConfig::from_env_or_yaml()?;
    let model = run(&config).await?;
    tracing::info!(rules = model.len(), "policy store check complete");
    Ok(())
}

async fn run(config: &PolicyStoreConfig) -> anyhow::Result<PolicyModel> {
    let store = store::connect(config).await?;
    store.health_check().await.context("policy store health check")?;
    let adapter = PolicyAdapter::new(store);

    if let Some(path) = &config.seed_file {
        seed::seed_if_empty(&adapter, path).await?;
    }

    let mut model = PolicyModel::new();
    let loaded = adapter.load_policy(&mut model).await?;
    let enforcer = rbac::enforcer::build_enforcer(&model)
        .await
        .context("build enforcer")?;
    tracing::info!(
        loaded,
        durable = adapter.store().is_durable(),
        backend = adapter.store().backend_name(),
        policies = enforcer.get_policy().len(),
        groupings = enforcer.get_grouping_policy().len(),
        "policy loaded"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_store::config::StorageBackend;
    use std::io::Write;

    fn memory_config() -> PolicyStoreConfig {
        PolicyStoreConfig {
            storage: StorageBackend::Memory,
            postgres: None,
            run_migrations: false,
            seed_file: None,
        }
    }

    #[tokio::test]
    async fn run_memory_backend_without_seed() {
        let model = run(&memory_config()).await.expect("run");
        assert!(model.is_empty());
    }

    #[tokio::test]
    async fn run_seeds_and_loads() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "p, alice, data1, read\ng, bob, admin").expect("write");
        let config = PolicyStoreConfig {
            seed_file: Some(file.path().to_path_buf()),
            ..memory_config()
        };
        let model = run(&config).await.expect("run");
        assert_eq!(model.len(), 2);
    }

    #[tokio::test]
    async fn run_postgres_requires_config() {
        let config = PolicyStoreConfig {
            storage: StorageBackend::Postgres,
            ..memory_config()
        };
        let err = run(&config).await.err().expect("missing postgres");
        assert!(err.to_string().contains("postgres configuration missing"));
    }
}
