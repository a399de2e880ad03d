use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    SeverityReport, error::StorageError, metadata::exif::SourceContext, storage::ReportStore,
};

pub struct PersistenceRequest {
    pub report: SeverityReport,
    pub timestamp: DateTime<Utc>,
    pub context: SourceContext,
    pub reply: oneshot::Sender<Result<String, StorageError>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceStats {
    pub stored: u64,
    pub failed: u64,
}

/// Result of a submitted store call. Dropping it is fine.
pub struct PendingStore {
    receiver: oneshot::Receiver<Result<String, StorageError>>,
}

impl PendingStore {
    pub async fn outcome(self) -> Result<String, StorageError> {
        self.receiver
            .await
            .unwrap_or(Err(StorageError::WorkerClosed))
    }
}

#[derive(Clone)]
pub struct PersistenceHandle {
    sender: mpsc::UnboundedSender<PersistenceRequest>,
}

impl PersistenceHandle {
    pub fn submit(&self, report: SeverityReport, context: SourceContext) -> PendingStore {
        let (reply, receiver) = oneshot::channel();
        let request = PersistenceRequest {
            report,
            timestamp: Utc::now(),
            context,
            reply,
        };

        if let Err(mpsc::error::SendError(request)) = self.sender.send(request) {
            let _ = request.reply.send(Err(StorageError::WorkerClosed));
        }

        PendingStore { receiver }
    }
}

pub struct PersistenceWorker;

impl PersistenceWorker {
    /// Must be called inside a tokio runtime. The worker exits once every
    /// handle is dropped.
    pub fn spawn(store: Arc<dyn ReportStore>) -> (PersistenceHandle, JoinHandle<PersistenceStats>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<PersistenceRequest>();

        let worker = tokio::spawn(async move {
            let mut stats = PersistenceStats::default();

            while let Some(request) = receiver.recv().await {
                let PersistenceRequest {
                    report,
                    timestamp,
                    context,
                    reply,
                } = request;

                let task_store = Arc::clone(&store);
                let result = tokio::task::spawn_blocking(move || {
                    task_store.store(&report, timestamp, &context)
                })
                .await
                .unwrap_or_else(|err| Err(StorageError::Unavailable(err.to_string())));

                match &result {
                    Ok(id) => {
                        stats.stored += 1;
                        info!("analysis result saved to {} with id {}", store.name(), id);
                    }
                    Err(err) => {
                        stats.failed += 1;
                        warn!("error saving analysis result to {}: {}", store.name(), err);
                    }
                }

                let _ = reply.send(result);
            }

            stats
        });

        (PersistenceHandle { sender }, worker)
    }
}
