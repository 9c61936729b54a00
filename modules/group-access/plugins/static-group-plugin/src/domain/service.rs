//! Service implementation for the static group plugin.

use std::collections::{HashMap, HashSet};

use access_security::{Filter, Record, ScopeValue, properties};
use group_access_sdk::StoreError;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::StaticGroupPluginConfig;

/// In-memory record store.
///
/// - Records are kept per model in insertion order
/// - Queries use [`Filter::matches`]; an unknown model has no records
/// - [`Service::fail_on`] makes every call on a model fail, for deny-on-error tests
#[derive(Default)]
pub struct Service {
    models: RwLock<HashMap<String, Vec<Record>>>,
    failing: RwLock<HashSet<String>>,
}

impl Service {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &StaticGroupPluginConfig) -> Self {
        let svc = Self::new();
        for (model, rows) in &config.models {
            svc.insert_all(model, rows.iter().cloned());
        }
        svc
    }

    pub fn insert(&self, model: &str, record: Record) {
        self.models
            .write()
            .entry(model.to_owned())
            .or_default()
            .push(record);
    }

    pub fn insert_all(&self, model: &str, records: impl IntoIterator<Item = Record>) {
        self.models
            .write()
            .entry(model.to_owned())
            .or_default()
            .extend(records);
    }

    /// Upsert by `id`. A record without an id gets one past the largest
    /// integer id of the model.
    ///
    /// # Errors
    ///
    /// `Unavailable` when the model is failing, `Internal` when the integer
    /// ids are exhausted.
    pub fn save(&self, model: &str, mut record: Record) -> Result<Record, StoreError> {
        self.check(model)?;
        let mut models = self.models.write();
        let rows = models.entry(model.to_owned()).or_default();

        let id = match record.get(properties::ID) {
            Some(id) => id.clone(),
            None => {
                let id = ScopeValue::Int(next_int_id(rows)?);
                record.insert(properties::ID.to_owned(), id.clone());
                id
            }
        };

        match rows
            .iter_mut()
            .find(|r| r.get(properties::ID) == Some(&id))
        {
            Some(existing) => existing.clone_from(&record),
            None => rows.push(record.clone()),
        }
        debug!(model, id = %id, "Saved record");
        Ok(record)
    }

    /// Make every subsequent call on `model` fail.
    pub fn fail_on(&self, model: &str) {
        self.failing.write().insert(model.to_owned());
    }

    /// Undo [`Service::fail_on`].
    pub fn recover(&self, model: &str) {
        self.failing.write().remove(model);
    }

    /// # Errors
    ///
    /// `Unavailable` when the model is failing.
    pub fn find(&self, model: &str, filter: Option<&Filter>) -> Result<Vec<Record>, StoreError> {
        self.check(model)?;
        let models = self.models.read();
        Ok(models
            .get(model)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter.is_none_or(|f| f.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// `Unavailable` when the model is failing.
    pub fn count(&self, model: &str, filter: Option<&Filter>) -> Result<u64, StoreError> {
        self.check(model)?;
        let models = self.models.read();
        let n = models.get(model).map_or(0, |rows| {
            rows.iter()
                .filter(|r| filter.is_none_or(|f| f.matches(r)))
                .count()
        });
        u64::try_from(n).map_err(|e| StoreError::Internal(e.to_string()))
    }

    /// # Errors
    ///
    /// `Unavailable` when the model is failing.
    pub fn find_by_id(&self, model: &str, id: &ScopeValue) -> Result<Option<Record>, StoreError> {
        self.check(model)?;
        let models = self.models.read();
        Ok(models.get(model).and_then(|rows| {
            rows.iter()
                .find(|r| r.get(properties::ID) == Some(id))
                .cloned()
        }))
    }

    fn check(&self, model: &str) -> Result<(), StoreError> {
        if self.failing.read().contains(model) {
            return Err(StoreError::Unavailable(format!("model '{model}' is unavailable")));
        }
        Ok(())
    }
}

fn next_int_id(rows: &[Record]) -> Result<i64, StoreError> {
    let max = rows
        .iter()
        .filter_map(|r| match r.get(properties::ID) {
            Some(ScopeValue::Int(n)) => Some(*n),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    max.checked_add(1)
        .ok_or_else(|| StoreError::Internal("integer ids exhausted".to_owned()))
}
