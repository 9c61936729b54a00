//! Configuration for the static group plugin.

use std::collections::BTreeMap;

use access_security::Record;
use serde::Deserialize;

/// Plugin configuration.
///
/// ```yaml
/// models:
///   Store:
///     - { id: A }
///   StoreUser:
///     - { userId: storeAdminA, storeId: A, role: admin }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticGroupPluginConfig {
    /// Seed records per model name.
    pub models: BTreeMap<String, Vec<Record>>,
}
