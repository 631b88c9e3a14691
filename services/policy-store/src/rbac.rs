//! Enforcement-engine boundary.
//!
//! # Purpose
//! Builds Casbin enforcers from policy models loaded through the adapter.
pub mod enforcer;

/// Default RBAC model used by [`enforcer::build_enforcer`].
pub const MODEL_CONF: &str = include_str!("rbac/model.conf");
