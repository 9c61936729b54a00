//! Group role principals such as `$group:admin`.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Delimiter between the principal namespace and the role name.
pub const ROLE_DELIMITER: char = ':';

/// A validated dynamic role principal.
///
/// The configured string is split on [`ROLE_DELIMITER`]; the second segment
/// is the role name stored in membership records.
///
/// ```
/// use group_access_sdk::RolePrincipal;
///
/// let admin = RolePrincipal::parse("$group:admin").unwrap();
/// assert_eq!(admin.role_name(), "admin");
/// assert!(RolePrincipal::parse("badformat").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RolePrincipal {
    principal: String,
    role: String,
}

impl RolePrincipal {
    /// Parse a configured role principal.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::InvalidRolePrincipal` when there is no non-empty
    /// segment after the delimiter.
    pub fn parse(principal: &str) -> Result<Self, ConfigurationError> {
        match principal.split(ROLE_DELIMITER).nth(1) {
            Some(role) if !role.is_empty() => Ok(Self {
                principal: principal.to_owned(),
                role: role.to_owned(),
            }),
            _ => Err(ConfigurationError::InvalidRolePrincipal(principal.to_owned())),
        }
    }

    /// The full principal string, e.g. `$group:admin`.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// The role name, e.g. `admin`.
    #[must_use]
    pub fn role_name(&self) -> &str {
        &self.role
    }
}

impl FromStr for RolePrincipal {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RolePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.principal)
    }
}
