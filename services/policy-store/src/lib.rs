//! Relational persistence for access-control policy rules.
//!
//! # Purpose
//! Stores variable-arity policy tuples (`p, alice, data1, read`) as fixed-width
//! rows, loads them back into a [`model::PolicyModel`], and deletes rows by
//! exact match or by a positional filter window.
//!
//! # Notes
//! [`adapter::PolicyAdapter`] is the async entry point and
//! [`adapter::blocking::BlockingPolicyAdapter`] wraps it for synchronous
//! callers. Backends live under [`store`].
pub mod adapter;
pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod observability;
pub mod rbac;
pub mod seed;
pub mod store;

pub use adapter::{PolicyAdapter, RemoveOutcome, blocking::BlockingPolicyAdapter};
pub use error::{PolicyError, PolicyResult};
pub use model::{FIELD_COUNT, PolicyModel, PolicyRow, PolicyTuple};
pub use store::{PolicyStore, StoreError};
