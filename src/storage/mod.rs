pub mod file;
pub mod worker;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{SeverityReport, error::StorageError, metadata::exif::SourceContext};

pub const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: String,
    pub report: SeverityReport,
    pub timestamp: DateTime<Utc>,
    pub context: SourceContext,
}

/// Persistence for finished reports.
pub trait ReportStore: Send + Sync {
    fn store(
        &self,
        report: &SeverityReport,
        timestamp: DateTime<Utc>,
        context: &SourceContext,
    ) -> Result<String, StorageError>;

    /// Most recent first.
    fn list_recent(&self, limit: usize) -> Result<Vec<StoredAnalysis>, StorageError>;

    fn name(&self) -> &str;
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Newest first; records sharing a timestamp keep reverse insertion order.
pub(crate) fn most_recent_first(mut records: Vec<StoredAnalysis>, limit: usize) -> Vec<StoredAnalysis> {
    records.reverse();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(limit);
    records
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredAnalysis>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ReportStore for MemoryStore {
    fn store(
        &self,
        report: &SeverityReport,
        timestamp: DateTime<Utc>,
        context: &SourceContext,
    ) -> Result<String, StorageError> {
        let id = new_id();
        self.records.write().push(StoredAnalysis {
            id: id.clone(),
            report: report.clone(),
            timestamp,
            context: context.clone(),
        });
        Ok(id)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<StoredAnalysis>, StorageError> {
        let records = self.records.read().clone();
        Ok(most_recent_first(records, limit))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
