//! Determines which group an invocation concerns.

use std::borrow::Cow;
use std::sync::Arc;

use access_security::{Record, ScopeValue};
use group_access_sdk::{AccessContext, ResourceRepository, StoreError};
use tracing::debug;

use super::registry::{GroupAccessor, GroupModelRegistry};

/// Resolves the current group (where the instance lives now) and the target
/// group (where the payload would put it).
#[derive(Clone)]
pub struct GroupResolutionStrategy {
    registry: Arc<GroupModelRegistry>,
    resources: Arc<dyn ResourceRepository>,
}

impl GroupResolutionStrategy {
    #[must_use]
    pub fn new(registry: Arc<GroupModelRegistry>, resources: Arc<dyn ResourceRepository>) -> Self {
        Self {
            registry,
            resources,
        }
    }

    /// Group the invocation concerns, tried in order:
    /// 1. the accessed instance, when an id is given
    /// 2. the payload of a new instance
    /// 3. an equality on the group key in the caller's where-clause
    ///
    /// `None` when no group can be determined.
    ///
    /// # Errors
    ///
    /// Store failures while fetching the instance or its parents.
    #[tracing::instrument(skip_all, fields(model = %ctx.model))]
    pub async fn current_group_id(
        &self,
        ctx: &AccessContext,
    ) -> Result<Option<ScopeValue>, StoreError> {
        if let Some(id) = &ctx.model_id {
            if self.registry.is_group_model(&ctx.model) {
                return Ok(Some(id.clone()));
            }
            debug!(model_id = %id, "Fetching group id from existing instance");
            return match self.resources.find_by_id(&ctx.model, id).await? {
                Some(instance) => self.group_of_record(&ctx.model, &instance).await,
                None => {
                    debug!(model_id = %id, "Instance not found");
                    Ok(None)
                }
            };
        }
        if let Some(payload) = &ctx.payload
            && !self.registry.is_group_model(&ctx.model)
            && let Some(group_id) = self.group_of_record(&ctx.model, payload).await?
        {
            return Ok(Some(group_id));
        }
        self.group_of_filter(ctx).await
    }

    /// Group the payload assigns the instance to, if it names one.
    ///
    /// # Errors
    ///
    /// Store failures while resolving a chained payload key.
    #[tracing::instrument(skip_all, fields(model = %ctx.model))]
    pub async fn target_group_id(
        &self,
        ctx: &AccessContext,
    ) -> Result<Option<ScopeValue>, StoreError> {
        if self.registry.is_group_model(&ctx.model) {
            return Ok(None);
        }
        match &ctx.payload {
            Some(payload) => self.group_of_record(&ctx.model, payload).await,
            None => Ok(None),
        }
    }

    /// Read the group from an equality on the model's group key in the
    /// caller's where-clause. For chained models the key names a parent,
    /// which is followed up to the group.
    async fn group_of_filter(&self, ctx: &AccessContext) -> Result<Option<ScopeValue>, StoreError> {
        let Some(filter) = &ctx.filter else {
            return Ok(None);
        };
        let Some(key) = self.registry.filter_key(&ctx.model) else {
            return Ok(None);
        };
        let Some(value) = filter.eq_value_for(key) else {
            debug!(key, "No group key equality in where-clause");
            return Ok(None);
        };
        debug!(key, value = %value, "Using group key from where-clause");
        if self.registry.is_group_model(&ctx.model) {
            return Ok(Some(value.clone()));
        }
        let keyed = Record::from([(key.to_owned(), value.clone())]);
        self.group_of_record(&ctx.model, &keyed).await
    }

    /// Follow `model`'s accessor chain from `record` to a group id.
    ///
    /// # Errors
    ///
    /// Store failures while fetching parents.
    pub async fn group_of_record(
        &self,
        model: &str,
        record: &Record,
    ) -> Result<Option<ScopeValue>, StoreError> {
        let chain = self.registry.chain(model);
        if chain.is_empty() {
            return Ok(record.get(self.registry.foreign_key()).cloned());
        }

        let mut current: Cow<'_, Record> = Cow::Borrowed(record);
        for (name, accessor) in chain {
            let Some(key) = current.get(accessor.foreign_key()).cloned() else {
                debug!(model = name, key = accessor.foreign_key(), "Group key missing");
                return Ok(None);
            };
            match accessor {
                GroupAccessor::Direct { .. } => return Ok(Some(key)),
                GroupAccessor::Through { parent, .. } => {
                    match self.resources.find_by_id(parent, &key).await? {
                        Some(next) => current = Cow::Owned(next),
                        None => {
                            debug!(model = %parent, id = %key, "Parent instance not found");
                            return Ok(None);
                        }
                    }
                }
            }
        }
        Ok(None)
    }
}
