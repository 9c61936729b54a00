//! Framework-facing extension points: dynamic roles and model hooks.
//!
//! The hosting framework owns a [`RoleRegistry`] and a [`HookRegistry`];
//! the group access component registers itself into both at setup and the
//! framework calls [`RoleRegistry::resolve`], [`HookRegistry::run_access`]
//! and [`HookRegistry::run_before_save`] while serving requests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::GroupAccessError;
use crate::models::{AccessContext, Query, SaveContext};
use crate::scope::RequestScope;

/// A dynamic role predicate, evaluated per request.
#[async_trait]
pub trait DynamicRoleResolver: Send + Sync {
    /// `true` grants the role for this invocation. Errors must be collapsed
    /// into `false` by the implementation.
    async fn resolve(&self, scope: &RequestScope, ctx: &AccessContext) -> bool;
}

/// Runs before a read, count or update-by-query reaches the store.
#[async_trait]
pub trait AccessHook: Send + Sync {
    /// # Errors
    ///
    /// Store failures while computing the hook's effect.
    async fn on_access(&self, scope: &RequestScope, query: &mut Query)
    -> Result<(), GroupAccessError>;
}

/// Runs before an instance is persisted.
#[async_trait]
pub trait BeforeSaveHook: Send + Sync {
    /// # Errors
    ///
    /// Store failures while computing the hook's effect.
    async fn before_save(
        &self,
        scope: &RequestScope,
        save: &mut SaveContext,
    ) -> Result<(), GroupAccessError>;
}

/// Dynamic roles by principal string (`$group:admin`).
#[derive(Default)]
pub struct RoleRegistry {
    resolvers: RwLock<HashMap<String, Arc<dyn DynamicRoleResolver>>>,
}

impl RoleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the resolver for `role`.
    pub fn register(&self, role: impl Into<String>, resolver: Arc<dyn DynamicRoleResolver>) {
        let role = role.into();
        tracing::debug!(role = %role, "Registering dynamic role resolver");
        self.resolvers.write().insert(role, resolver);
    }

    #[must_use]
    pub fn is_registered(&self, role: &str) -> bool {
        self.resolvers.read().contains_key(role)
    }

    /// Registered role principals, sorted.
    #[must_use]
    pub fn roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self.resolvers.read().keys().cloned().collect();
        roles.sort();
        roles
    }

    /// Evaluate `role`. An unknown role is never granted.
    pub async fn resolve(&self, role: &str, scope: &RequestScope, ctx: &AccessContext) -> bool {
        let resolver = self.resolvers.read().get(role).cloned();
        match resolver {
            Some(resolver) => resolver.resolve(scope, ctx).await,
            None => {
                tracing::debug!(role, "No resolver registered for role");
                false
            }
        }
    }
}

/// Model hooks keyed by model name, run in registration order.
#[derive(Default)]
pub struct HookRegistry {
    access: RwLock<HashMap<String, Vec<Arc<dyn AccessHook>>>>,
    before_save: RwLock<HashMap<String, Vec<Arc<dyn BeforeSaveHook>>>>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_access(&self, model: impl Into<String>, hook: Arc<dyn AccessHook>) {
        self.access.write().entry(model.into()).or_default().push(hook);
    }

    pub fn register_before_save(&self, model: impl Into<String>, hook: Arc<dyn BeforeSaveHook>) {
        self.before_save
            .write()
            .entry(model.into())
            .or_default()
            .push(hook);
    }

    #[must_use]
    pub fn has_access_hook(&self, model: &str) -> bool {
        self.access.read().get(model).is_some_and(|h| !h.is_empty())
    }

    #[must_use]
    pub fn has_before_save_hook(&self, model: &str) -> bool {
        self.before_save
            .read()
            .get(model)
            .is_some_and(|h| !h.is_empty())
    }

    /// Run every access hook registered for `query.model`.
    ///
    /// # Errors
    ///
    /// The first hook error; later hooks are not run.
    pub async fn run_access(
        &self,
        scope: &RequestScope,
        query: &mut Query,
    ) -> Result<(), GroupAccessError> {
        let hooks = self.access.read().get(&query.model).cloned().unwrap_or_default();
        for hook in hooks {
            hook.on_access(scope, query).await?;
        }
        Ok(())
    }

    /// Run every before-save hook registered for `save.model`.
    ///
    /// # Errors
    ///
    /// The first hook error; later hooks are not run.
    pub async fn run_before_save(
        &self,
        scope: &RequestScope,
        save: &mut SaveContext,
    ) -> Result<(), GroupAccessError> {
        let hooks = self
            .before_save
            .read()
            .get(&save.model)
            .cloned()
            .unwrap_or_default();
        for hook in hooks {
            hook.before_save(scope, save).await?;
        }
        Ok(())
    }
}
