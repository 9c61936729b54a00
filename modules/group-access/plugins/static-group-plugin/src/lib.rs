//! Static group plugin
//!
//! In-memory [`group_access_sdk::ResourceRepository`] serving memberships,
//! users and resource records from configuration. For development and
//! tests; not a persistence layer.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::StaticGroupPluginConfig;
pub use domain::Service;
