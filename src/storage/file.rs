use std::{
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::{
    SeverityReport,
    error::StorageError,
    metadata::exif::SourceContext,
    storage::{ReportStore, StoredAnalysis, most_recent_first, new_id},
};

/// Append-only store keeping one JSON document per line.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<StoredAnalysis>, StorageError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }

        Ok(records)
    }
}

impl ReportStore for JsonLinesStore {
    fn store(
        &self,
        report: &SeverityReport,
        timestamp: DateTime<Utc>,
        context: &SourceContext,
    ) -> Result<String, StorageError> {
        let record = StoredAnalysis {
            id: new_id(),
            report: report.clone(),
            timestamp,
            context: context.clone(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;

        Ok(record.id)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<StoredAnalysis>, StorageError> {
        let records = {
            let _guard = self.write_lock.lock();
            self.read_all()?
        };
        Ok(most_recent_first(records, limit))
    }

    fn name(&self) -> &str {
        "json-lines"
    }
}
