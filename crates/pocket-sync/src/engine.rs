//! Full-replace sync: the remote ends up holding exactly the local records.
//!
//! Steps run strictly in order: fetch every remote record, delete each of
//! them, then upload each non-deleted local record and mark it synced. The
//! first failure aborts the run. Remote changes already made stay made.

use std::future::Future;

use serde::Serialize;
use tracing::{debug, info, warn};

use pocket_storage::RecordRepository;

use crate::cancel::CancelToken;
use crate::error::SyncError;
use crate::remote::{RemoteCollaborator, RemotePayload};

/// Counts from a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub deleted: usize,
    pub uploaded: usize,
}

/// Pushes one repository's records to one remote.
pub struct SyncEngine<R> {
    repo: RecordRepository,
    remote: R,
}

impl<R: RemoteCollaborator> SyncEngine<R> {
    pub fn new(repo: RecordRepository, remote: R) -> Self {
        Self { repo, remote }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Overwrite the remote collection with the local records.
    pub async fn full_replace(&self, cancel: &CancelToken) -> Result<SyncReport, SyncError> {
        let entity = self.repo.kind();
        let mut report = SyncReport::default();

        let local = self
            .repo
            .list(false)
            .map_err(|e| SyncError::at("reading local records")(e.into()))?;
        info!(entity = %entity, local = local.len(), "Sync started");

        let remote_records = guarded(cancel, self.remote.fetch_all())
            .await
            .map_err(SyncError::at("fetching remote records"))?;
        report.fetched = remote_records.len();
        debug!(fetched = report.fetched, "Fetched remote records");

        for item in &remote_records {
            guarded(cancel, self.remote.delete(&item.id))
                .await
                .map_err(SyncError::at(format!("deleting remote record {}", item.id)))?;
            report.deleted += 1;
        }
        debug!(deleted = report.deleted, "Cleared remote collection");

        for record in &local {
            let payload = RemotePayload::from(record);
            let created = guarded(cancel, self.remote.create(&payload))
                .await
                .map_err(SyncError::at(format!("uploading local record {}", record.id)))?;

            self.repo
                .mark_synced(record.id, &created.id)
                .map_err(|e| {
                    SyncError::at(format!("marking local record {} synced", record.id))(e.into())
                })?;
            report.uploaded += 1;
        }

        info!(
            entity = %entity,
            fetched = report.fetched,
            deleted = report.deleted,
            uploaded = report.uploaded,
            "Sync finished"
        );
        Ok(report)
    }
}

/// Race a remote call against cancellation. Cancellation wins ties.
async fn guarded<T, F>(cancel: &CancelToken, call: F) -> Result<T, SyncError>
where
    F: Future<Output = Result<T, SyncError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("Sync cancelled");
            Err(SyncError::Cancelled)
        }
        result = call => result,
    }
}
