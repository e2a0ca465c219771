//! Research report attachments owned by a task.

use super::ResearchDomainError;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format tag of a research report (for example `markdown`, `pdf`, `excel`).
///
/// Opaque to the coordinator beyond selecting "most recent of this type";
/// normalised to lowercase so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportType(String);

impl ReportType {
    /// Creates a validated report format tag.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchDomainError::EmptyReportType`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ResearchDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ResearchDomainError::EmptyReportType);
        }
        Ok(Self(normalized))
    }

    /// Returns the `markdown` format tag, the coordinator's default.
    #[must_use]
    pub fn markdown() -> Self {
        Self("markdown".to_owned())
    }

    /// Returns the format tag as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ReportType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a report payload lives.
///
/// Textual formats carry their payload inline; binary formats reference
/// externally stored bytes by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "storage", rename_all = "snake_case")]
pub enum ReportBody {
    /// Inline textual payload.
    Inline {
        /// Report content.
        content: String,
    },
    /// Reference to externally stored bytes.
    File {
        /// Path to the stored payload.
        path: String,
    },
}

/// Research report attached to a task.
///
/// A task may accumulate many reports over its life; retrieval always
/// returns the newest report of the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    report_type: ReportType,
    title: String,
    body: ReportBody,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReportData {
    /// Persisted format tag.
    pub report_type: ReportType,
    /// Persisted report title.
    pub title: String,
    /// Persisted payload location.
    pub body: ReportBody,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Creates a new report timestamped from the clock.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchDomainError::EmptyReportTitle`] when the title is
    /// empty after trimming.
    pub fn new(
        report_type: ReportType,
        title: impl Into<String>,
        body: ReportBody,
        clock: &impl Clock,
    ) -> Result<Self, ResearchDomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ResearchDomainError::EmptyReportTitle);
        }
        Ok(Self {
            report_type,
            title,
            body,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a report from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedReportData) -> Self {
        Self {
            report_type: data.report_type,
            title: data.title,
            body: data.body,
            created_at: data.created_at,
        }
    }

    /// Returns the format tag.
    #[must_use]
    pub const fn report_type(&self) -> &ReportType {
        &self.report_type
    }

    /// Returns the report title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the payload location.
    #[must_use]
    pub const fn body(&self) -> &ReportBody {
        &self.body
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
