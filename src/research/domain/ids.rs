//! Identifier and validated scalar types for the research domain.

use super::ResearchDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of the random hex suffix appended to generated task identifiers.
const GENERATED_SUFFIX_LEN: usize = 8;

/// Globally unique, immutable identifier of a research task.
///
/// Either client-supplied or generated as `region_<regionId>_<random8hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a validated task identifier from caller input.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchDomainError::EmptyTaskId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ResearchDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(ResearchDomainError::EmptyTaskId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Generates a fresh identifier for the given region.
    #[must_use]
    pub fn generate(region_id: &RegionId) -> Self {
        let mut suffix = Uuid::new_v4().simple().to_string();
        suffix.truncate(GENERATED_SUFFIX_LEN);
        Self(format!("region_{}_{suffix}", region_id.as_str()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Administrative region code a research task targets (TERYT-style).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    /// Creates a validated region identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchDomainError::EmptyRegionId`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ResearchDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(ResearchDomainError::EmptyRegionId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the region identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RegionId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable name of the region a research task targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionName(String);

impl RegionName {
    /// Creates a validated region name.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchDomainError::EmptyRegionName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ResearchDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(ResearchDomainError::EmptyRegionName);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the region name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RegionName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque key into the external municipality reference catalog.
///
/// The coordinator only ever checks whether the key resolves; the catalog
/// record itself stays outside the domain boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MunicipalityId(i64);

impl MunicipalityId {
    /// Wraps a raw catalog key.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying key value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MunicipalityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
