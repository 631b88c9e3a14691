//! Policy data model module.
//!
//! # Purpose
//! Re-exports the fixed-width row shape persisted by the stores and the
//! variable-arity tuple/model shapes consumed by the enforcement engine.
mod policy;
mod row;

pub use policy::{PolicyModel, PolicyTuple, SECTIONS};
pub(crate) use policy::section_of;
pub use row::{FIELD_COUNT, PolicyRow};
