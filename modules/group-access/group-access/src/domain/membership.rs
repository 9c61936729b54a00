//! Group membership lookups.

use std::sync::Arc;

use access_security::{Filter, Record, ScopeValue, properties};
use group_access_sdk::{GroupMembership, RequestScope, ResourceRepository, StoreError};
use tracing::debug;

/// Reads (user, group, role) rows from the group access model.
#[derive(Clone)]
pub struct GroupMembershipStore {
    repo: Arc<dyn ResourceRepository>,
    model: String,
    foreign_key: String,
}

impl GroupMembershipStore {
    #[must_use]
    pub fn new(
        repo: Arc<dyn ResourceRepository>,
        model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            model: model.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// `true` if at least one membership row grants `role` in `group_id`.
    ///
    /// # Errors
    ///
    /// Store failures are propagated, never read as "no membership".
    #[tracing::instrument(skip_all, fields(user_id = %user_id, role = %role, group_id = %group_id))]
    pub async fn has_role(
        &self,
        user_id: &ScopeValue,
        role: &str,
        group_id: &ScopeValue,
    ) -> Result<bool, StoreError> {
        let filter = Filter::all([
            Filter::eq(properties::USER_ID, user_id),
            Filter::eq(properties::ROLE, role),
            Filter::eq(self.foreign_key.as_str(), group_id),
        ]);
        let count = self.repo.count(&self.model, Some(&filter)).await?;
        debug!(count, "Counted matching memberships");
        Ok(count > 0)
    }

    /// Memberships of `user_id`, served from the request scope when it
    /// belongs to the same user unless `force` is set.
    ///
    /// # Errors
    ///
    /// Store failures on a fresh lookup.
    pub async fn memberships_of(
        &self,
        scope: &RequestScope,
        user_id: &ScopeValue,
        force: bool,
    ) -> Result<Vec<GroupMembership>, StoreError> {
        if !force && let Some(cached) = scope.cached_memberships_for(user_id) {
            return Ok(cached.to_vec());
        }
        self.fetch(user_id).await
    }

    /// Fresh lookup of all memberships of `user_id`.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn fetch(&self, user_id: &ScopeValue) -> Result<Vec<GroupMembership>, StoreError> {
        let filter = Filter::eq(properties::USER_ID, user_id);
        let rows = self.repo.find(&self.model, Some(&filter)).await?;
        Ok(rows
            .iter()
            .filter_map(|row| membership_from_record(row, &self.foreign_key))
            .collect())
    }

    /// Distinct group ids of `user_id`, in first-seen order.
    ///
    /// # Errors
    ///
    /// Same as [`GroupMembershipStore::memberships_of`].
    pub async fn group_ids_of(
        &self,
        scope: &RequestScope,
        user_id: &ScopeValue,
    ) -> Result<Vec<ScopeValue>, StoreError> {
        let memberships = self.memberships_of(scope, user_id, false).await?;
        let mut ids: Vec<ScopeValue> = Vec::with_capacity(memberships.len());
        for m in memberships {
            if !ids.contains(&m.group_id) {
                ids.push(m.group_id);
            }
        }
        Ok(ids)
    }
}

/// Rows missing the user, group or role are skipped.
fn membership_from_record(row: &Record, foreign_key: &str) -> Option<GroupMembership> {
    Some(GroupMembership {
        user_id: row.get(properties::USER_ID)?.clone(),
        group_id: row.get(foreign_key)?.clone(),
        role: row.get(properties::ROLE)?.to_string(),
    })
}
