//! Seeding the store from a policy-line file.
//!
//! The file holds one rule per line in policy line form
//! (`p, alice, data1, read`). Blank lines and `#` comments are ignored.
use crate::adapter::PolicyAdapter;
use crate::model::PolicyTuple;
use anyhow::{Context, Result};
use futures::TryStreamExt;
use std::fs;
use std::path::Path;

pub fn parse_policy_lines(contents: &str) -> Result<Vec<PolicyTuple>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(number, line)| {
            line.parse::<PolicyTuple>()
                .with_context(|| format!("line {}", number + 1))
        })
        .collect()
}

pub fn read_policy_file(path: &Path) -> Result<Vec<PolicyTuple>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read policy file {}", path.display()))?;
    parse_policy_lines(&contents).with_context(|| format!("parse policy file {}", path.display()))
}

/// Save the rules in `path` when the store holds no loadable rule yet.
/// Returns the number of rows written.
pub async fn seed_if_empty(adapter: &PolicyAdapter, path: &Path) -> Result<u64> {
    if adapter.load_all().try_next().await?.is_some() {
        tracing::info!(path = %path.display(), "policy store already populated, skipping seed");
        return Ok(0);
    }
    let tuples = read_policy_file(path)?;
    let inserted = adapter.save_all(&tuples).await?;
    tracing::info!(path = %path.display(), inserted, "policy store seeded");
    Ok(inserted)
}
