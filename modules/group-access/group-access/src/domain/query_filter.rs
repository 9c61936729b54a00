//! Narrows queries to the groups of the calling principal.

use std::sync::Arc;

use access_security::{Filter, ScopeValue, properties};
use async_trait::async_trait;
use group_access_sdk::{
    AccessHook, GroupAccessError, Query, RequestScope, ResourceRepository, StoreError,
};
use tracing::debug;

use super::membership::GroupMembershipStore;
use super::registry::{GroupAccessor, GroupModelRegistry};

/// Access hook injecting `{ key: { in: [group ids] } }` into queries that
/// follow a successful group role check.
#[derive(Clone)]
pub struct QueryFilterInjector {
    registry: Arc<GroupModelRegistry>,
    memberships: GroupMembershipStore,
    resources: Arc<dyn ResourceRepository>,
}

impl QueryFilterInjector {
    #[must_use]
    pub fn new(
        registry: Arc<GroupModelRegistry>,
        memberships: GroupMembershipStore,
        resources: Arc<dyn ResourceRepository>,
    ) -> Self {
        Self {
            registry,
            memberships,
            resources,
        }
    }

    /// The group predicate for `model` as seen by `user_id`.
    ///
    /// `None` for models that are neither the group model nor group content.
    /// Chained models are constrained on their parent key, with the parent
    /// ids looked up under the parent's own group predicate.
    ///
    /// # Errors
    ///
    /// Store failures while loading memberships or parent ids.
    pub async fn build_filter(
        &self,
        scope: &RequestScope,
        model: &str,
        user_id: &ScopeValue,
    ) -> Result<Option<Filter>, StoreError> {
        let is_group_model = self.registry.is_group_model(model);
        if !is_group_model && !self.registry.is_group_content(model) {
            return Ok(None);
        }
        let group_ids = self.memberships.group_ids_of(scope, user_id).await?;

        if is_group_model {
            return Ok(Some(Filter::r#in(properties::ID, group_ids)));
        }

        let mut chain = self.registry.chain(model);
        chain.reverse();

        let mut filter: Option<Filter> = None;
        for (_, accessor) in chain {
            filter = Some(match (accessor, filter.take()) {
                (GroupAccessor::Direct { foreign_key }, _) => {
                    Filter::r#in(foreign_key.as_str(), group_ids.iter())
                }
                (GroupAccessor::Through { foreign_key, parent }, Some(parent_filter)) => {
                    let parents = self.resources.find(parent, Some(&parent_filter)).await?;
                    let ids = parents.iter().filter_map(|p| p.get(properties::ID));
                    Filter::r#in(foreign_key.as_str(), ids)
                }
                (GroupAccessor::Through { .. }, None) => return Ok(None),
            });
        }
        Ok(filter)
    }
}

#[async_trait]
impl AccessHook for QueryFilterInjector {
    #[tracing::instrument(skip_all, fields(model = %query.model, kind = ?query.kind))]
    async fn on_access(
        &self,
        scope: &RequestScope,
        query: &mut Query,
    ) -> Result<(), GroupAccessError> {
        if query.skip_authorization || query.is_group_scoped() || !scope.group_acl_applied() {
            return Ok(());
        }
        let Some(user_id) = scope.subject_id() else {
            return Ok(());
        };

        if let Some(filter) = self.build_filter(scope, &query.model, user_id).await? {
            debug!(?filter, "Scoping query to principal's groups");
            query.scope_with(filter);
        }
        Ok(())
    }
}
