//! Collaborator traits the group access core depends on.

use access_security::{Filter, Record, ScopeValue};
use async_trait::async_trait;

use crate::error::StoreError;

/// Read access to persisted models.
///
/// Backs both the membership lookups (the group access model) and the
/// resource lookups made while resolving group ids. Calls made through this
/// trait bypass group authorization.
///
/// ```ignore
/// let store: Arc<dyn ResourceRepository> = Arc::new(plugin_service);
///
/// let rows = store.find("Invoice", Some(&Filter::eq("storeId", "A"))).await?;
/// ```
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// All records of `model` matching `filter` (all records when `None`).
    ///
    /// # Errors
    ///
    /// `Unavailable` or `Internal` for store failures. An unknown model
    /// has no records.
    async fn find(&self, model: &str, filter: Option<&Filter>) -> Result<Vec<Record>, StoreError>;

    /// Number of records of `model` matching `filter`.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceRepository::find`].
    async fn count(&self, model: &str, filter: Option<&Filter>) -> Result<u64, StoreError>;

    /// A single record by primary key.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceRepository::find`].
    async fn find_by_id(&self, model: &str, id: &ScopeValue) -> Result<Option<Record>, StoreError>;
}
