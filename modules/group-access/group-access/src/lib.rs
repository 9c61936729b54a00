//! Group Access Module
//!
//! Group-scoped authorization for model-driven APIs: dynamic `$group:<role>`
//! resolvers backed by membership rows, an access hook narrowing queries to
//! the caller's groups, and a before-save hook stamping the owning group on
//! new instances.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod module;

pub use config::{GroupAccessConfig, GroupAccessSettings};
pub use module::{Collaborators, GroupAccess};
