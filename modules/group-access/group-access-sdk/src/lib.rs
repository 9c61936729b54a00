#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Group Access SDK
//!
//! Public surface of the group access module:
//!
//! - [`ResourceRepository`] - persistence collaborator trait
//! - [`RequestScope`] - per-request principal and memberships
//! - [`RoleRegistry`], [`HookRegistry`] - framework extension points
//! - [`RolePrincipal`] - validated `$group:<role>` principals
//! - [`GroupAccessError`], [`StoreError`], [`ConfigurationError`] - error types
//!
//! ## Usage
//!
//! ```ignore
//! let roles = RoleRegistry::new();
//! let hooks = HookRegistry::new();
//! group_access.register(&roles, &hooks);
//!
//! let scope = loader.load(Some(&token)).await?;
//! let ctx = AccessContext::new("Invoice", "findById").with_id("1");
//! if roles.resolve("$group:admin", &scope, &ctx).await {
//!     let mut query = Query::find("Invoice");
//!     hooks.run_access(&scope, &mut query).await?;
//! }
//! ```

pub mod api;
pub mod error;
pub mod hooks;
pub mod models;
pub mod role;
pub mod scope;

pub use api::ResourceRepository;
pub use error::{ConfigurationError, GroupAccessError, StoreError};
pub use hooks::{AccessHook, BeforeSaveHook, DynamicRoleResolver, HookRegistry, RoleRegistry};
pub use models::{
    AccessContext, AccessToken, GroupMembership, ModelDefinition, Query, QueryKind, Relation,
    RelationKind, SaveContext,
};
pub use role::RolePrincipal;
pub use scope::RequestScope;
