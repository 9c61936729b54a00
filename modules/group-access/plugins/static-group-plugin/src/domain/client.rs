//! Client implementation for the static group plugin.

use access_security::{Filter, Record, ScopeValue};
use async_trait::async_trait;
use group_access_sdk::{ResourceRepository, StoreError};

use super::service::Service;

#[async_trait]
impl ResourceRepository for Service {
    async fn find(&self, model: &str, filter: Option<&Filter>) -> Result<Vec<Record>, StoreError> {
        Service::find(self, model, filter)
    }

    async fn count(&self, model: &str, filter: Option<&Filter>) -> Result<u64, StoreError> {
        Service::count(self, model, filter)
    }

    async fn find_by_id(&self, model: &str, id: &ScopeValue) -> Result<Option<Record>, StoreError> {
        Service::find_by_id(self, model, id)
    }
}
