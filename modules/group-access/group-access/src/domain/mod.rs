//! Domain layer for group access.

pub mod membership;
pub mod pre_save;
pub mod principal;
pub mod query_filter;
pub mod registry;
pub mod resolution;
pub mod resolver;

pub use membership::GroupMembershipStore;
pub use pre_save::PreSaveGroupAssigner;
pub use principal::PrincipalLoader;
pub use query_filter::QueryFilterInjector;
pub use registry::{GroupAccessor, GroupModelRegistry};
pub use resolution::GroupResolutionStrategy;
pub use resolver::{Decision, DenyReason, Grant, RoleResolver};
