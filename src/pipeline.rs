use std::{path::Path, sync::Arc};

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{
    SeverityEngine, SeverityReport,
    error::{DecodeError, Result},
    metadata::exif::{ExifExtractor, SourceContext},
    report::PresentationState,
    storage::worker::{PendingStore, PersistenceHandle},
};

pub struct AnalysisOutcome {
    pub report: SeverityReport,
    pub presentation: PresentationState,
    pub context: SourceContext,
    /// `None` when no persistence worker is attached.
    pub persistence: Option<PendingStore>,
}

/// Async front end over [`SeverityEngine`]: read, decode off the runtime,
/// classify, then hand the report to persistence.
#[derive(Clone)]
pub struct AnalysisPipeline {
    engine: Arc<SeverityEngine>,
    persistence: Option<PersistenceHandle>,
}

impl AnalysisPipeline {
    pub fn new(engine: SeverityEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            persistence: None,
        }
    }

    pub fn with_persistence(mut self, handle: PersistenceHandle) -> Self {
        self.persistence = Some(handle);
        self
    }

    pub fn engine(&self) -> &SeverityEngine {
        &self.engine
    }

    pub async fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisOutcome> {
        let origin = path
            .as_ref()
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        let file = tokio::fs::File::open(path.as_ref()).await?;
        self.analyze_reader(file, origin).await
    }

    pub async fn analyze_reader<R: AsyncRead + Unpin>(
        &self,
        mut reader: R,
        origin: Option<String>,
    ) -> Result<AnalysisOutcome> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        self.analyze_bytes(bytes, origin).await
    }

    pub async fn analyze_bytes(&self, bytes: Vec<u8>, origin: Option<String>) -> Result<AnalysisOutcome> {
        debug!("analysing {} bytes from {:?}", bytes.len(), origin);

        let engine = Arc::clone(&self.engine);
        let (report, context) = tokio::task::spawn_blocking(move || -> Result<_> {
            let report = engine.analyze(&bytes)?;
            let context = ExifExtractor::extract(&bytes, origin);
            Ok((report, context))
        })
        .await
        .map_err(|err| DecodeError::Aborted(err.to_string()))??;

        debug!(
            "classified as {} (score {})",
            report.severity_band(),
            report.severity_score()
        );

        let presentation = PresentationState::from(&report);
        let persistence = self
            .persistence
            .as_ref()
            .map(|handle| handle.submit(report.clone(), context.clone()));

        Ok(AnalysisOutcome {
            report,
            presentation,
            context,
            persistence,
        })
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new(SeverityEngine::default())
    }
}
