//! Domain models exchanged between the framework and the group access core.

use access_security::{Filter, Record, ScopeValue};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// A (user, group, role) membership row.
///
/// Duplicates are harmless: every check is an OR over matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub user_id: ScopeValue,
    pub group_id: ScopeValue,
    pub role: String,
}

/// A verified access token handed over by the authentication layer.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Token id. Never logged.
    pub id: SecretString,
    /// The user the token was issued to.
    pub user_id: ScopeValue,
}

impl AccessToken {
    #[must_use]
    pub fn new(id: impl Into<SecretString>, user_id: impl Into<ScopeValue>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
        }
    }
}

/// The invocation being authorized by a role resolver.
///
/// `model_id` is set for instance operations (`GET /Invoices/1`); `payload`
/// carries the incoming data for mutations; `filter` is the caller's
/// where-clause on collection reads (`GET /Invoices?storeId=A`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    pub model: String,
    pub model_id: Option<ScopeValue>,
    pub payload: Option<Record>,
    pub filter: Option<Filter>,
    pub operation: String,
}

impl AccessContext {
    #[must_use]
    pub fn new(model: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            model_id: None,
            payload: None,
            filter: None,
            operation: operation.into(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<ScopeValue>) -> Self {
        self.model_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Record) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Query operations the access hook is invoked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryKind {
    #[default]
    Find,
    Count,
    UpdateAll,
}

/// A read, count or update-by-query operation about to reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub model: String,
    pub kind: QueryKind,
    pub filter: Option<Filter>,
    pub skip_authorization: bool,
    group_scoped: bool,
}

impl Query {
    #[must_use]
    pub fn new(model: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            model: model.into(),
            kind,
            filter: None,
            skip_authorization: false,
            group_scoped: false,
        }
    }

    #[must_use]
    pub fn find(model: impl Into<String>) -> Self {
        Self::new(model, QueryKind::Find)
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Internal lookups made by the authorization layer itself.
    #[must_use]
    pub fn skipping_authorization(mut self) -> Self {
        self.skip_authorization = true;
        self
    }

    /// AND-compose `filter` with the caller's filter and mark the query scoped.
    ///
    /// Returns `false` without touching the query if it was already scoped.
    pub fn scope_with(&mut self, filter: Filter) -> bool {
        if self.group_scoped {
            return false;
        }
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self.group_scoped = true;
        true
    }

    #[must_use]
    pub fn is_group_scoped(&self) -> bool {
        self.group_scoped
    }
}

/// An instance about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveContext {
    pub model: String,
    pub instance: Record,
    pub is_new_instance: bool,
    pub skip_authorization: bool,
}

impl SaveContext {
    #[must_use]
    pub fn create(model: impl Into<String>, instance: Record) -> Self {
        Self {
            model: model.into(),
            instance,
            is_new_instance: true,
            skip_authorization: false,
        }
    }

    #[must_use]
    pub fn update(model: impl Into<String>, instance: Record) -> Self {
        Self {
            is_new_instance: false,
            ..Self::create(model, instance)
        }
    }
}

/// Kind of a model relation. Only `BelongsTo` makes a model group content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    HasManyThrough,
}

/// A relation declared on a model definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
    /// Target model name.
    pub model: String,
    /// Explicit foreign key. Defaults to `<name>Id` for `BelongsTo`.
    #[serde(default)]
    pub foreign_key: Option<String>,
}

impl Relation {
    #[must_use]
    pub fn belongs_to(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::BelongsTo,
            model: model.into(),
            foreign_key: None,
        }
    }

    #[must_use]
    pub fn has_many(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::HasMany,
            ..Self::belongs_to(name, model)
        }
    }

    #[must_use]
    pub fn with_foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    /// The property on the declaring model that holds the target id.
    #[must_use]
    pub fn key_property(&self) -> String {
        self.foreign_key
            .clone()
            .unwrap_or_else(|| format!("{}Id", self.name))
    }
}

/// Relationship metadata of one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl ModelDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn belongs_to(&self) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(|r| r.kind == RelationKind::BelongsTo)
    }
}
