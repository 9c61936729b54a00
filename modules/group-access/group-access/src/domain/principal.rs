//! Builds the per-request scope from an authenticated access token.

use std::sync::Arc;

use access_security::SecurityContext;
use group_access_sdk::{AccessToken, GroupAccessError, RequestScope, ResourceRepository};
use tracing::debug;

use super::membership::GroupMembershipStore;

/// Loads the user record and memberships behind an access token.
#[derive(Clone)]
pub struct PrincipalLoader {
    users: Arc<dyn ResourceRepository>,
    memberships: GroupMembershipStore,
    user_model: String,
    foreign_key: String,
}

impl PrincipalLoader {
    #[must_use]
    pub fn new(
        users: Arc<dyn ResourceRepository>,
        memberships: GroupMembershipStore,
        user_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            users,
            memberships,
            user_model: user_model.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// A request without a token gets an anonymous scope.
    ///
    /// # Errors
    ///
    /// - `UnknownPrincipal` when the token's user does not exist
    /// - `Store` when either lookup fails
    #[tracing::instrument(skip_all, fields(user_model = %self.user_model))]
    pub async fn load(&self, token: Option<&AccessToken>) -> Result<RequestScope, GroupAccessError> {
        let Some(token) = token else {
            debug!("No access token, using anonymous scope");
            return Ok(RequestScope::anonymous());
        };

        let (user, memberships) = tokio::try_join!(
            self.users.find_by_id(&self.user_model, &token.user_id),
            self.memberships.fetch(&token.user_id),
        )?;

        let Some(user) = user else {
            return Err(GroupAccessError::UnknownPrincipal {
                user_id: token.user_id.clone(),
            });
        };

        debug!(
            user_id = %token.user_id,
            memberships = memberships.len(),
            "Loaded principal"
        );

        let security = SecurityContext::builder()
            .subject_id(token.user_id.clone())
            .subject_type(&self.user_model)
            .subject_group_id(user.get(&self.foreign_key).cloned())
            .access_token(token.id.clone())
            .build();
        Ok(RequestScope::new(security).with_memberships(memberships))
    }
}
