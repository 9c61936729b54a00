//! Error types for the group access module.

use access_security::ScopeValue;
use thiserror::Error;

/// Failures reported by a persistence collaborator.
///
/// A store failure is never interpreted as "no rows"; callers either
/// propagate it or turn it into a deny.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store is not reachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Invalid setup. Fatal: the component refuses to start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("invalid role principal '{0}': expected '$group:<role>'")]
    InvalidRolePrincipal(String),

    #[error("option '{option}' must not be empty")]
    EmptyOption { option: &'static str },

    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Errors surfaced by the group access services and hooks.
#[derive(Debug, Error)]
pub enum GroupAccessError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The access token refers to a user that does not exist.
    #[error("no user with this access token was found (user id {user_id})")]
    UnknownPrincipal { user_id: ScopeValue },
}
