//! Casbin enforcer builder.
//!
//! # Purpose and responsibility
//! Constructs an in-memory Casbin enforcer populated from a [`PolicyModel`]
//! read out of the policy store, for authorization checks.
//!
//! # Key invariants and assumptions
//! - The default Casbin model configuration is embedded in `MODEL_CONF`.
//! - Rules whose tag the Casbin model does not define are skipped with a
//!   warning rather than failing the whole build.
//! - Duplicate rules collapse: Casbin keeps one copy of each rule.
use crate::model::{PolicyModel, PolicyTuple, section_of};
use crate::rbac::MODEL_CONF;
use casbin::{CoreApi, DefaultModel, Enforcer, MemoryAdapter, MgmtApi, Result};

/// Build an enforcer using the embedded RBAC model.
///
/// # Example
/// ```rust
/// use policy_store::model::{PolicyModel, PolicyTuple};
/// use policy_store::rbac::enforcer::build_enforcer;
/// use casbin::CoreApi;
///
/// # async fn build() -> casbin::Result<()> {
/// let model: PolicyModel = vec![
///     PolicyTuple::new("p", ["admin", "data1", "read"]),
///     PolicyTuple::new("g", ["alice", "admin"]),
/// ]
/// .into_iter()
/// .collect();
/// let enforcer = build_enforcer(&model).await?;
/// assert!(enforcer.enforce(("alice", "data1", "read"))?);
/// # Ok(())
/// # }
/// ```
pub async fn build_enforcer(model: &PolicyModel) -> Result<Enforcer> {
    build_enforcer_with_conf(MODEL_CONF, model).await
}

/// Build an enforcer from a caller-supplied Casbin model configuration.
pub async fn build_enforcer_with_conf(conf: &str, model: &PolicyModel) -> Result<Enforcer> {
    let casbin_model = DefaultModel::from_str(conf).await?;
    // The store remains the durable copy; the enforcer only needs a working set.
    let adapter = MemoryAdapter::default();
    let mut enforcer = Enforcer::new(casbin_model, adapter).await?;

    let mut skipped = 0usize;
    for PolicyTuple { ptype, rule } in model.tuples() {
        let Some(section) = section_defined(&enforcer, &ptype) else {
            skipped += 1;
            tracing::warn!(%ptype, "casbin model has no definition for policy type");
            continue;
        };
        if section == "g" {
            enforcer.add_named_grouping_policy(&ptype, rule).await?;
        } else {
            enforcer.add_named_policy(&ptype, rule).await?;
        }
    }

    enforcer.build_role_links()?;
    tracing::debug!(rules = model.len(), skipped, "enforcer built");
    Ok(enforcer)
}

fn section_defined(enforcer: &Enforcer, ptype: &str) -> Option<&'static str> {
    let section = section_of(ptype)?;
    enforcer
        .get_model()
        .get_model()
        .get(section)
        .filter(|assertions| assertions.contains_key(ptype))
        .map(|_| section)
}
