//! Configuration for the group access module.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use group_access_sdk::{ConfigurationError, RolePrincipal};
use serde::Deserialize;

/// Prefix of environment variables overriding file configuration,
/// e.g. `GROUP_ACCESS_APPLY_TO_STATIC=true`.
pub const ENV_PREFIX: &str = "GROUP_ACCESS_";

/// Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupAccessConfig {
    /// Model holding principals.
    pub user_model: String,

    /// Model holding static roles. Group roles are plain strings on
    /// membership rows, so this is only checked for presence.
    pub role_model: String,

    /// Model acting as the group (tenant) type.
    pub group_model: String,

    /// Model holding (user, group, role) memberships.
    pub group_access_model: String,

    /// Property referencing the owning group. Derived from `group_model`
    /// when unset (`Store` -> `storeId`).
    pub foreign_key: Option<String>,

    /// Dynamic role principals to register, `$group:<role>`.
    pub group_roles: Vec<String>,

    /// Explicit list of group content models. Discovered from relation
    /// metadata when unset.
    pub group_content_models: Option<Vec<String>>,

    /// Grant group roles on operations with no determinable group.
    pub apply_to_static: bool,
}

impl Default for GroupAccessConfig {
    fn default() -> Self {
        Self {
            user_model: "User".to_owned(),
            role_model: "Role".to_owned(),
            group_model: "Group".to_owned(),
            group_access_model: "GroupAccess".to_owned(),
            foreign_key: None,
            group_roles: vec!["$group:admin".to_owned(), "$group:member".to_owned()],
            group_content_models: None,
            apply_to_static: false,
        }
    }
}

/// Validated configuration used by the domain services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAccessSettings {
    pub user_model: String,
    pub group_model: String,
    pub group_access_model: String,
    pub foreign_key: String,
    pub roles: Vec<RolePrincipal>,
    pub group_content_models: Option<Vec<String>>,
    pub apply_to_static: bool,
}

impl GroupAccessConfig {
    /// Load from a YAML file, then apply `GROUP_ACCESS_*` environment overrides.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::Load` when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        Self::from_figment(Figment::new().merge(Yaml::file(path)))
    }

    /// Extract from `figment` after merging environment overrides on top.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::Load` when extraction fails.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigurationError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ConfigurationError::Load(e.to_string()))
    }

    /// The group foreign key property.
    #[must_use]
    pub fn foreign_key(&self) -> String {
        if let Some(key) = &self.foreign_key {
            return key.clone();
        }
        let mut chars = self.group_model.chars();
        match chars.next() {
            Some(first) => format!("{}{}Id", first.to_lowercase(), chars.as_str()),
            None => "id".to_owned(),
        }
    }

    /// Parse every configured role principal.
    ///
    /// # Errors
    ///
    /// The first malformed principal.
    pub fn role_principals(&self) -> Result<Vec<RolePrincipal>, ConfigurationError> {
        self.group_roles
            .iter()
            .map(|r| RolePrincipal::parse(r))
            .collect()
    }

    /// Validate into [`GroupAccessSettings`].
    ///
    /// # Errors
    ///
    /// - `EmptyOption` when a model name or the foreign key is empty
    /// - `InvalidRolePrincipal` for a malformed role principal
    pub fn validate(&self) -> Result<GroupAccessSettings, ConfigurationError> {
        for (option, value) in [
            ("user_model", &self.user_model),
            ("role_model", &self.role_model),
            ("group_model", &self.group_model),
            ("group_access_model", &self.group_access_model),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigurationError::EmptyOption { option });
            }
        }
        if self.foreign_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(ConfigurationError::EmptyOption {
                option: "foreign_key",
            });
        }

        Ok(GroupAccessSettings {
            user_model: self.user_model.clone(),
            group_model: self.group_model.clone(),
            group_access_model: self.group_access_model.clone(),
            foreign_key: self.foreign_key(),
            roles: self.role_principals()?,
            group_content_models: self.group_content_models.clone(),
            apply_to_static: self.apply_to_static,
        })
    }
}
