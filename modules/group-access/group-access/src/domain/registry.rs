//! Startup map from resource model to the way it reaches its owning group.

use std::collections::BTreeMap;

use access_security::properties;
use group_access_sdk::ModelDefinition;
use tracing::debug;

/// How instances of a group content model reference their group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupAccessor {
    /// The model carries the group key itself.
    Direct { foreign_key: String },
    /// The model belongs to `parent`, itself group content, via `foreign_key`.
    Through { foreign_key: String, parent: String },
}

impl GroupAccessor {
    #[must_use]
    pub fn foreign_key(&self) -> &str {
        match self {
            Self::Direct { foreign_key } | Self::Through { foreign_key, .. } => foreign_key,
        }
    }
}

/// Immutable after construction; parents are always registered before their
/// children, so every chain ends at a [`GroupAccessor::Direct`] entry.
#[derive(Debug, Clone)]
pub struct GroupModelRegistry {
    group_model: String,
    foreign_key: String,
    accessors: BTreeMap<String, GroupAccessor>,
}

impl GroupModelRegistry {
    /// Discover group content models from relation metadata.
    #[must_use]
    pub fn discover(
        group_model: &str,
        foreign_key: &str,
        definitions: &[ModelDefinition],
    ) -> Self {
        let mut accessors = BTreeMap::new();

        for def in definitions.iter().filter(|d| d.name != group_model) {
            if let Some(rel) = def.belongs_to().find(|r| r.model == group_model) {
                let key = rel.foreign_key.clone().unwrap_or_else(|| foreign_key.to_owned());
                accessors.insert(def.name.clone(), GroupAccessor::Direct { foreign_key: key });
            }
        }

        loop {
            let mut added = false;
            for def in definitions {
                if def.name == group_model || accessors.contains_key(&def.name) {
                    continue;
                }
                let parent = def
                    .belongs_to()
                    .find(|r| accessors.contains_key(&r.model));
                if let Some(rel) = parent {
                    accessors.insert(
                        def.name.clone(),
                        GroupAccessor::Through {
                            foreign_key: rel.key_property(),
                            parent: rel.model.clone(),
                        },
                    );
                    added = true;
                }
            }
            if !added {
                break;
            }
        }

        debug!(
            group_model,
            models = ?accessors.keys().collect::<Vec<_>>(),
            "Discovered group content models"
        );

        Self {
            group_model: group_model.to_owned(),
            foreign_key: foreign_key.to_owned(),
            accessors,
        }
    }

    /// Register exactly `names`, using relation metadata where it yields a
    /// chain inside the list and the configured foreign key otherwise.
    #[must_use]
    pub fn explicit(
        group_model: &str,
        foreign_key: &str,
        names: &[String],
        definitions: &[ModelDefinition],
    ) -> Self {
        let discovered = Self::discover(group_model, foreign_key, definitions);
        let direct = |key: &str| GroupAccessor::Direct {
            foreign_key: key.to_owned(),
        };
        let mut accessors = BTreeMap::new();
        let listed: Vec<&String> = names.iter().filter(|n| *n != group_model).collect();

        for name in &listed {
            match discovered.accessors.get(*name) {
                Some(GroupAccessor::Through { .. }) => {}
                Some(found) => {
                    accessors.insert((*name).clone(), found.clone());
                }
                None => {
                    accessors.insert((*name).clone(), direct(foreign_key));
                }
            }
        }

        loop {
            let mut added = false;
            for name in &listed {
                if accessors.contains_key(*name) {
                    continue;
                }
                if let Some(through @ GroupAccessor::Through { parent, .. }) =
                    discovered.accessors.get(*name)
                    && accessors.contains_key(parent)
                {
                    accessors.insert((*name).clone(), through.clone());
                    added = true;
                }
            }
            if !added {
                break;
            }
        }

        for name in listed {
            accessors
                .entry(name.clone())
                .or_insert_with(|| direct(foreign_key));
        }

        Self {
            group_model: group_model.to_owned(),
            foreign_key: foreign_key.to_owned(),
            accessors,
        }
    }

    #[must_use]
    pub fn group_model(&self) -> &str {
        &self.group_model
    }

    /// The configured group foreign key.
    #[must_use]
    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    #[must_use]
    pub fn is_group_model(&self, model: &str) -> bool {
        self.group_model == model
    }

    #[must_use]
    pub fn is_group_content(&self, model: &str) -> bool {
        self.accessors.contains_key(model)
    }

    /// Group content model names, sorted.
    #[must_use]
    pub fn group_content_models(&self) -> Vec<&str> {
        self.accessors.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn accessor(&self, model: &str) -> Option<&GroupAccessor> {
        self.accessors.get(model)
    }

    /// The property a group filter on `model` constrains: the id for the
    /// group model, the accessor's key for content models.
    #[must_use]
    pub fn filter_key(&self, model: &str) -> Option<&str> {
        if self.is_group_model(model) {
            return Some(properties::ID);
        }
        self.accessor(model).map(GroupAccessor::foreign_key)
    }

    /// Accessors from `model` up to the model holding the group key,
    /// paired with the model each accessor applies to.
    #[must_use]
    pub fn chain(&self, model: &str) -> Vec<(&str, &GroupAccessor)> {
        let mut chain = Vec::new();
        let mut current = model;
        while let Some((name, accessor)) = self.accessors.get_key_value(current) {
            chain.push((name.as_str(), accessor));
            match accessor {
                GroupAccessor::Direct { .. } => break,
                GroupAccessor::Through { parent, .. } => current = parent.as_str(),
            }
        }
        chain
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use group_access_sdk::Relation;

    use super::*;

    fn store_definitions() -> Vec<ModelDefinition> {
        vec![
            ModelDefinition::new("Transaction").relation(Relation::belongs_to("invoice", "Invoice")),
            ModelDefinition::new("Store").relation(Relation::has_many("invoices", "Invoice")),
            ModelDefinition::new("Invoice")
                .relation(Relation::belongs_to("store", "Store"))
                .relation(Relation::has_many("transactions", "Transaction")),
            ModelDefinition::new("User"),
            ModelDefinition::new("StoreUser")
                .relation(Relation::belongs_to("store", "Store"))
                .relation(Relation::belongs_to("user", "User")),
        ]
    }

    #[test]
    fn discovers_direct_and_chained_models() {
        let reg = GroupModelRegistry::discover("Store", "storeId", &store_definitions());

        assert_eq!(
            reg.group_content_models(),
            ["Invoice", "StoreUser", "Transaction"]
        );
        assert_eq!(
            reg.accessor("Invoice"),
            Some(&GroupAccessor::Direct {
                foreign_key: "storeId".to_owned()
            })
        );
        assert_eq!(
            reg.accessor("Transaction"),
            Some(&GroupAccessor::Through {
                foreign_key: "invoiceId".to_owned(),
                parent: "Invoice".to_owned()
            })
        );
        assert!(!reg.is_group_content("Store"));
        assert!(!reg.is_group_content("User"));
    }

    #[test]
    fn filter_key_uses_id_for_group_model() {
        let reg = GroupModelRegistry::discover("Store", "storeId", &store_definitions());
        assert_eq!(reg.filter_key("Store"), Some("id"));
        assert_eq!(reg.filter_key("Invoice"), Some("storeId"));
        assert_eq!(reg.filter_key("Transaction"), Some("invoiceId"));
        assert_eq!(reg.filter_key("User"), None);
    }

    #[test]
    fn chain_walks_to_the_direct_model() {
        let reg = GroupModelRegistry::discover("Store", "storeId", &store_definitions());
        let models: Vec<&str> = reg.chain("Transaction").into_iter().map(|(m, _)| m).collect();
        assert_eq!(models, ["Transaction", "Invoice"]);
        assert!(reg.chain("User").is_empty());
    }

    #[test]
    fn cycles_without_group_link_are_not_registered() {
        let defs = vec![
            ModelDefinition::new("A").relation(Relation::belongs_to("b", "B")),
            ModelDefinition::new("B").relation(Relation::belongs_to("a", "A")),
        ];
        let reg = GroupModelRegistry::discover("Group", "groupId", &defs);
        assert!(reg.group_content_models().is_empty());
    }

    #[test]
    fn explicit_list_short_circuits_discovery() {
        let names = vec!["Invoice".to_owned(), "Transaction".to_owned(), "Note".to_owned()];
        let reg = GroupModelRegistry::explicit("Store", "storeId", &names, &store_definitions());

        assert_eq!(reg.group_content_models(), ["Invoice", "Note", "Transaction"]);
        assert!(!reg.is_group_content("StoreUser"));
        assert_eq!(reg.filter_key("Note"), Some("storeId"));
        assert_eq!(reg.filter_key("Transaction"), Some("invoiceId"));
    }

    #[test]
    fn explicit_child_without_listed_parent_uses_foreign_key() {
        let names = vec!["Transaction".to_owned()];
        let reg = GroupModelRegistry::explicit("Store", "storeId", &names, &store_definitions());
        assert_eq!(reg.filter_key("Transaction"), Some("storeId"));
    }
}
