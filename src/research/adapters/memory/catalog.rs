//! In-memory municipality catalog for tests and seeded deployments.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::research::domain::MunicipalityId;
use crate::research::ports::{CatalogResult, MunicipalityCatalog, MunicipalityRecord};

/// Municipality catalog backed by a fixed record set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMunicipalityCatalog {
    records: HashMap<i64, MunicipalityRecord>,
}

impl InMemoryMunicipalityCatalog {
    /// Creates an empty catalog resolving nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record to the catalog.
    #[must_use]
    pub fn with_record(mut self, record: MunicipalityRecord) -> Self {
        self.records.insert(record.id().value(), record);
        self
    }
}

#[async_trait]
impl MunicipalityCatalog for InMemoryMunicipalityCatalog {
    async fn find(&self, id: MunicipalityId) -> CatalogResult<Option<MunicipalityRecord>> {
        Ok(self.records.get(&id.value()).cloned())
    }
}
