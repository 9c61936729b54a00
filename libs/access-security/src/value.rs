use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scalar value used for identifiers and filterable properties.
///
/// Group ids, user ids and record fields are all `ScopeValue`s, so string
/// ids (`"A"`), numeric ids and UUIDs are handled uniformly.
///
/// Equality is semantic for UUIDs: `Uuid(u)` equals `String(s)` when `s`
/// parses to `u`. Values coming from configuration or a JSON payload can
/// therefore be compared with values produced in code.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeValue {
    /// UUID value (group IDs, resource IDs, etc.)
    Uuid(Uuid),
    /// String value (roles, string keys, etc.)
    String(String),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
}

impl PartialEq for ScopeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Uuid(u), Self::String(s)) | (Self::String(s), Self::Uuid(u)) => {
                Uuid::parse_str(s).is_ok_and(|parsed| parsed == *u)
            }
            _ => false,
        }
    }
}

impl Eq for ScopeValue {}

impl fmt::Display for ScopeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(u) => write!(f, "{u}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<Uuid> for ScopeValue {
    #[inline]
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<&Uuid> for ScopeValue {
    #[inline]
    fn from(u: &Uuid) -> Self {
        Self::Uuid(*u)
    }
}

impl From<String> for ScopeValue {
    #[inline]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for ScopeValue {
    #[inline]
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<i64> for ScopeValue {
    #[inline]
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for ScopeValue {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&ScopeValue> for ScopeValue {
    #[inline]
    fn from(v: &ScopeValue) -> Self {
        v.clone()
    }
}
