//! Group access component.

use std::sync::Arc;

use group_access_sdk::{
    ConfigurationError, HookRegistry, ModelDefinition, ResourceRepository, RoleRegistry,
};
use tracing::info;

use crate::config::{GroupAccessConfig, GroupAccessSettings};
use crate::domain::{
    GroupMembershipStore, GroupModelRegistry, GroupResolutionStrategy, PreSaveGroupAssigner,
    PrincipalLoader, QueryFilterInjector, RoleResolver,
};

/// External collaborators the component is wired to.
pub struct Collaborators {
    /// Store for resource, user and group lookups.
    pub resources: Arc<dyn ResourceRepository>,
    /// Store holding the group access model.
    pub memberships: Arc<dyn ResourceRepository>,
    /// Relationship metadata of every model.
    pub models: Vec<ModelDefinition>,
}

impl Collaborators {
    /// One store serving every model.
    #[must_use]
    pub fn single(store: Arc<dyn ResourceRepository>, models: Vec<ModelDefinition>) -> Self {
        Self {
            resources: Arc::clone(&store),
            memberships: store,
            models,
        }
    }
}

/// Group access component.
///
/// Setup:
/// 1. Validates configuration, rejecting malformed role principals
/// 2. Builds the group model registry from relation metadata
/// 3. Creates one role resolver per configured principal
///
/// [`GroupAccess::register`] then plugs the resolvers and hooks into the
/// framework registries.
pub struct GroupAccess {
    settings: GroupAccessSettings,
    registry: Arc<GroupModelRegistry>,
    resolvers: Vec<Arc<RoleResolver>>,
    query_filter: Arc<QueryFilterInjector>,
    pre_save: Arc<PreSaveGroupAssigner>,
    principals: PrincipalLoader,
}

impl GroupAccess {
    /// # Errors
    ///
    /// `ConfigurationError` for invalid options.
    #[tracing::instrument(skip_all, fields(group_model = %config.group_model))]
    pub fn setup(
        config: &GroupAccessConfig,
        collaborators: Collaborators,
    ) -> Result<Self, ConfigurationError> {
        let settings = config.validate()?;
        info!(
            roles = ?config.group_roles,
            foreign_key = %settings.foreign_key,
            apply_to_static = settings.apply_to_static,
            "Initializing group access"
        );

        let Collaborators {
            resources,
            memberships,
            mut models,
        } = collaborators;
        // Membership rows are read internally, never through the hooks.
        models.retain(|d| d.name != settings.group_access_model);

        let registry = Arc::new(match &settings.group_content_models {
            Some(names) => GroupModelRegistry::explicit(
                &settings.group_model,
                &settings.foreign_key,
                names,
                &models,
            ),
            None => {
                GroupModelRegistry::discover(&settings.group_model, &settings.foreign_key, &models)
            }
        });
        info!(
            models = ?registry.group_content_models(),
            "Resolved group content models"
        );

        let membership_store = GroupMembershipStore::new(
            memberships,
            settings.group_access_model.clone(),
            settings.foreign_key.clone(),
        );
        let resolution =
            GroupResolutionStrategy::new(Arc::clone(&registry), Arc::clone(&resources));

        let resolvers = settings
            .roles
            .iter()
            .map(|principal| {
                Arc::new(RoleResolver::new(
                    principal.clone(),
                    membership_store.clone(),
                    resolution.clone(),
                    settings.apply_to_static,
                ))
            })
            .collect();

        let query_filter = Arc::new(QueryFilterInjector::new(
            Arc::clone(&registry),
            membership_store.clone(),
            Arc::clone(&resources),
        ));
        let pre_save = Arc::new(PreSaveGroupAssigner::new(Arc::clone(&registry)));
        let principals = PrincipalLoader::new(
            resources,
            membership_store,
            settings.user_model.clone(),
            settings.foreign_key.clone(),
        );

        Ok(Self {
            settings,
            registry,
            resolvers,
            query_filter,
            pre_save,
            principals,
        })
    }

    /// Register role resolvers and model hooks.
    ///
    /// Every group content model gets the access and before-save hooks; the
    /// group model gets the access hook only.
    pub fn register(&self, roles: &RoleRegistry, hooks: &HookRegistry) {
        for resolver in &self.resolvers {
            roles.register(resolver.principal().principal(), resolver.clone());
        }

        hooks.register_access(self.registry.group_model(), self.query_filter.clone());
        for model in self.registry.group_content_models() {
            hooks.register_access(model, self.query_filter.clone());
            hooks.register_before_save(model, self.pre_save.clone());
        }

        info!(
            roles = self.resolvers.len(),
            models = self.registry.group_content_models().len(),
            "Group access registered"
        );
    }

    #[must_use]
    pub fn settings(&self) -> &GroupAccessSettings {
        &self.settings
    }

    #[must_use]
    pub fn registry(&self) -> &GroupModelRegistry {
        &self.registry
    }

    #[must_use]
    pub fn principal_loader(&self) -> &PrincipalLoader {
        &self.principals
    }

    /// The resolver for a configured principal such as `$group:admin`.
    #[must_use]
    pub fn resolver(&self, principal: &str) -> Option<&RoleResolver> {
        self.resolvers
            .iter()
            .find(|r| r.principal().principal() == principal)
            .map(Arc::as_ref)
    }
}
