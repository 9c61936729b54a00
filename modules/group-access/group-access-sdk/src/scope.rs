//! Per-request principal storage.

use std::sync::atomic::{AtomicBool, Ordering};

use access_security::{ScopeValue, SecurityContext};

use crate::models::GroupMembership;

/// Everything the core knows about the principal of one request.
///
/// Created once per request and passed explicitly to every resolver and
/// hook. The only mutable part is the "authorized via group ACL" flag.
#[derive(Debug, Default)]
pub struct RequestScope {
    security: SecurityContext,
    memberships: Option<Vec<GroupMembership>>,
    group_acl_applied: AtomicBool,
}

impl RequestScope {
    #[must_use]
    pub fn new(security: SecurityContext) -> Self {
        Self {
            security,
            memberships: None,
            group_acl_applied: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Attach memberships loaded together with the principal.
    #[must_use]
    pub fn with_memberships(mut self, memberships: Vec<GroupMembership>) -> Self {
        self.memberships = Some(memberships);
        self
    }

    #[must_use]
    pub fn security(&self) -> &SecurityContext {
        &self.security
    }

    #[must_use]
    pub fn subject_id(&self) -> Option<&ScopeValue> {
        self.security.subject_id()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.security.is_authenticated()
    }

    /// Memberships cached for `user_id`, if this scope belongs to that user.
    #[must_use]
    pub fn cached_memberships_for(&self, user_id: &ScopeValue) -> Option<&[GroupMembership]> {
        match (self.subject_id(), &self.memberships) {
            (Some(subject), Some(memberships)) if subject == user_id => Some(memberships),
            _ => None,
        }
    }

    /// Record that a group role check granted access in this request.
    pub fn mark_group_acl_applied(&self) {
        self.group_acl_applied.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn group_acl_applied(&self) -> bool {
        self.group_acl_applied.load(Ordering::Acquire)
    }
}
