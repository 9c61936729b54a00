//! Stamps the owning group on new group content instances.

use std::sync::Arc;

use async_trait::async_trait;
use group_access_sdk::{BeforeSaveHook, GroupAccessError, RequestScope, SaveContext};
use tracing::{debug, warn};

use super::registry::{GroupAccessor, GroupModelRegistry};

/// Before-save hook filling the group foreign key from the principal.
#[derive(Clone)]
pub struct PreSaveGroupAssigner {
    registry: Arc<GroupModelRegistry>,
}

impl PreSaveGroupAssigner {
    #[must_use]
    pub fn new(registry: Arc<GroupModelRegistry>) -> Self {
        Self { registry }
    }

    /// Apply the assignment rules to `save`. Never fails.
    pub fn assign(&self, scope: &RequestScope, save: &mut SaveContext) {
        if !save.is_new_instance
            || save.skip_authorization
            || self.registry.is_group_model(&save.model)
        {
            return;
        }
        // Chained models carry a parent key, not the group key.
        let Some(GroupAccessor::Direct { foreign_key }) = self.registry.accessor(&save.model)
        else {
            return;
        };
        let principal_group = scope.security().subject_group_id();

        match (save.instance.get(foreign_key.as_str()), principal_group) {
            (Some(existing), Some(own)) if existing != own => {
                warn!(
                    model = %save.model,
                    key = %foreign_key,
                    instance_group = %existing,
                    principal_group = %own,
                    "Instance group differs from the principal's group"
                );
            }
            (Some(_), _) | (None, None) => {}
            (None, Some(own)) => {
                debug!(model = %save.model, key = %foreign_key, group_id = %own, "Assigning group");
                save.instance.insert(foreign_key.clone(), own.clone());
            }
        }
    }
}

#[async_trait]
impl BeforeSaveHook for PreSaveGroupAssigner {
    async fn before_save(
        &self,
        scope: &RequestScope,
        save: &mut SaveContext,
    ) -> Result<(), GroupAccessError> {
        self.assign(scope, save);
        Ok(())
    }
}
