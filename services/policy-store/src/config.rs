use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

// The URL may carry credentials.
impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .finish()
    }
}

// Policy store configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct PolicyStoreConfig {
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub run_migrations: bool,
    /// Policy-line file used to seed an empty store at startup.
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PolicyStoreConfigOverride {
    storage: Option<String>,
    postgres_url: Option<String>,
    postgres_max_connections: Option<u32>,
    postgres_connect_timeout_ms: Option<u64>,
    postgres_acquire_timeout_ms: Option<u64>,
    run_migrations: Option<bool>,
    seed_file: Option<PathBuf>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|err| anyhow::anyhow!("parse {key}: {err}")),
        Err(_) => Ok(default),
    }
}

impl PolicyStoreConfig {
    pub fn from_env() -> Result<Self> {
        let storage = env_parse("POLICY_STORE_BACKEND", StorageBackend::Memory)?;
        let url = std::env::var("POLICY_STORE_POSTGRES_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .ok();
        let postgres = match url {
            Some(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse(
                    "POLICY_STORE_PG_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                connect_timeout_ms: env_parse(
                    "POLICY_STORE_PG_CONNECT_TIMEOUT_MS",
                    DEFAULT_PG_CONNECT_TIMEOUT_MS,
                )?,
                acquire_timeout_ms: env_parse(
                    "POLICY_STORE_PG_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
                )?,
            }),
            None => None,
        };
        let run_migrations = env_parse("POLICY_STORE_RUN_MIGRATIONS", true)?;
        let seed_file = std::env::var("POLICY_STORE_SEED_FILE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Ok(Self {
            storage,
            postgres,
            run_migrations,
            seed_file,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("POLICY_STORE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read POLICY_STORE_CONFIG: {path}"))?;
            let override_cfg: PolicyStoreConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse policy store config yaml")?;
            config.apply(override_cfg)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, override_cfg: PolicyStoreConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.storage {
            self.storage = value.parse().with_context(|| "parse storage")?;
        }
        if let Some(url) = override_cfg.postgres_url {
            let pg = self.postgres.get_or_insert_with(|| PostgresConfig {
                url: String::new(),
                max_connections: DEFAULT_PG_MAX_CONNECTIONS,
                connect_timeout_ms: DEFAULT_PG_CONNECT_TIMEOUT_MS,
                acquire_timeout_ms: DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
            });
            pg.url = url;
        }
        if let Some(pg) = self.postgres.as_mut() {
            if let Some(value) = override_cfg.postgres_max_connections
                && value > 0
            {
                pg.max_connections = value;
            }
            if let Some(value) = override_cfg.postgres_connect_timeout_ms {
                pg.connect_timeout_ms = value;
            }
            if let Some(value) = override_cfg.postgres_acquire_timeout_ms {
                pg.acquire_timeout_ms = value;
            }
        }
        if let Some(value) = override_cfg.run_migrations {
            self.run_migrations = value;
        }
        if let Some(value) = override_cfg.seed_file {
            self.seed_file = Some(value);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.storage == StorageBackend::Postgres && self.postgres.is_none() {
            bail!("postgres backend selected but POLICY_STORE_POSTGRES_URL is not set");
        }
        Ok(())
    }
}
