//! Dynamic `$group:<role>` resolution.

use access_security::ScopeValue;
use async_trait::async_trait;
use group_access_sdk::{
    AccessContext, DynamicRoleResolver, GroupAccessError, RequestScope, RolePrincipal,
};
use tracing::{debug, error};

use super::membership::GroupMembershipStore;
use super::resolution::GroupResolutionStrategy;

/// Why a role was granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// The principal holds the role in every group involved.
    Membership { group_id: ScopeValue },
    /// No group could be determined and static operations are let through.
    Passthrough,
}

/// Why a role was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Anonymous,
    NoGroupContext,
    NotMember { group_id: ScopeValue },
    Reassignment { from: ScopeValue, to: ScopeValue },
}

/// Outcome of a role evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed(Grant),
    Denied(DenyReason),
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// Evaluates one configured role principal.
#[derive(Clone)]
pub struct RoleResolver {
    principal: RolePrincipal,
    memberships: GroupMembershipStore,
    resolution: GroupResolutionStrategy,
    apply_to_static: bool,
}

impl RoleResolver {
    #[must_use]
    pub fn new(
        principal: RolePrincipal,
        memberships: GroupMembershipStore,
        resolution: GroupResolutionStrategy,
        apply_to_static: bool,
    ) -> Self {
        Self {
            principal,
            memberships,
            resolution,
            apply_to_static,
        }
    }

    #[must_use]
    pub fn principal(&self) -> &RolePrincipal {
        &self.principal
    }

    /// Evaluate the role for `ctx`, marking `scope` on a grant.
    ///
    /// # Errors
    ///
    /// Store failures from group resolution or membership checks.
    #[tracing::instrument(
        skip_all,
        fields(
            role = %self.principal,
            model = %ctx.model,
            operation = %ctx.operation,
            model_id = ?ctx.model_id
        )
    )]
    pub async fn evaluate(
        &self,
        scope: &RequestScope,
        ctx: &AccessContext,
    ) -> Result<Decision, GroupAccessError> {
        let Some(user_id) = scope.subject_id() else {
            debug!("Access denied for anonymous user");
            return Ok(Decision::Denied(DenyReason::Anonymous));
        };
        let role = self.principal.role_name();

        let (current, target) = tokio::try_join!(
            self.resolution.current_group_id(ctx),
            self.resolution.target_group_id(ctx),
        )?;

        let Some(current) = current else {
            if self.apply_to_static {
                debug!("No group context, letting static operation through");
                scope.mark_group_acl_applied();
                return Ok(Decision::Allowed(Grant::Passthrough));
            }
            debug!("Unable to determine group context");
            return Ok(Decision::Denied(DenyReason::NoGroupContext));
        };

        let decision = match target.filter(|t| *t != current) {
            Some(target) => {
                debug!(from = %current, to = %target, "Checking group reassignment");
                let (in_current, in_target) = tokio::try_join!(
                    self.memberships.has_role(user_id, role, &current),
                    self.memberships.has_role(user_id, role, &target),
                )?;
                if in_current && in_target {
                    Decision::Allowed(Grant::Membership { group_id: current })
                } else {
                    Decision::Denied(DenyReason::Reassignment {
                        from: current,
                        to: target,
                    })
                }
            }
            None => {
                if self.memberships.has_role(user_id, role, &current).await? {
                    Decision::Allowed(Grant::Membership { group_id: current })
                } else {
                    Decision::Denied(DenyReason::NotMember { group_id: current })
                }
            }
        };

        debug!(user_id = %user_id, ?decision, "Evaluated group role");
        if decision.is_allowed() {
            scope.mark_group_acl_applied();
        }
        Ok(decision)
    }
}

#[async_trait]
impl DynamicRoleResolver for RoleResolver {
    async fn resolve(&self, scope: &RequestScope, ctx: &AccessContext) -> bool {
        match self.evaluate(scope, ctx).await {
            Ok(decision) => decision.is_allowed(),
            Err(e) => {
                error!(
                    role = %self.principal,
                    model = %ctx.model,
                    error = %e,
                    "Group role check failed, denying"
                );
                false
            }
        }
    }
}
