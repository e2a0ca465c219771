//! Lookup port into the external municipality reference catalog.
//!
//! The catalog is an external collaborator: the coordinator only needs a
//! lookup-by-identifier capability and treats the record as opaque. The
//! reference is weak: nothing cascades when a referenced record disappears.

use crate::research::domain::MunicipalityId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for catalog lookups.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Opaque municipality record returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MunicipalityRecord {
    id: MunicipalityId,
    name: String,
}

impl MunicipalityRecord {
    /// Creates a catalog record.
    #[must_use]
    pub fn new(id: MunicipalityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Returns the catalog key.
    #[must_use]
    pub const fn id(&self) -> MunicipalityId {
        self.id
    }

    /// Returns the municipality name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Errors returned by catalog implementations.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The catalog could not be queried.
    #[error("catalog lookup failed: {0}")]
    Lookup(Arc<dyn std::error::Error + Send + Sync>),
}

impl CatalogError {
    /// Wraps a lookup failure.
    pub fn lookup(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lookup(Arc::new(err))
    }
}

/// Read-only lookup into the municipality reference catalog.
#[async_trait]
pub trait MunicipalityCatalog: Send + Sync {
    /// Resolves a municipality reference.
    ///
    /// Returns `None` when the reference does not resolve.
    async fn find(&self, id: MunicipalityId) -> CatalogResult<Option<MunicipalityRecord>>;
}
