#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod context;
pub mod filter;
pub mod value;

pub use context::{SecurityContext, SecurityContextBuilder};
pub use filter::{
    EqScopeFilter, Filter, InScopeFilter, Record, ScopeFilter, ScopeFilterValues, properties,
};
pub use value::ScopeValue;
