//! In-process remote used in tests and offline runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::remote::{RemoteCollaborator, RemotePayload, RemoteRecord};

/// Where an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Fetch,
    /// Fail the n-th delete (0-based).
    Delete(usize),
    /// Fail the n-th create (0-based).
    Create(usize),
}

/// A remote collection held in memory, with ids assigned from a counter.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    records: Mutex<Vec<RemoteRecord>>,
    next_id: AtomicU64,
    deletes: AtomicU64,
    creates: AtomicU64,
    fail_at: Mutex<Option<FailPoint>>,
    stall_creates: AtomicBool,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given records already present.
    pub fn with_records(records: Vec<RemoteRecord>) -> Self {
        let remote = Self::new();
        let max_id = records
            .iter()
            .filter_map(|r| r.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        remote.next_id.store(max_id, Ordering::SeqCst);
        if let Ok(mut guard) = remote.records.lock() {
            *guard = records;
        }
        remote
    }

    pub fn fail_at(&self, point: FailPoint) {
        if let Ok(mut guard) = self.fail_at.lock() {
            *guard = Some(point);
        }
    }

    /// Make every create wait forever, to exercise cancellation.
    pub fn stall_creates(&self, stall: bool) {
        self.stall_creates.store(stall, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<RemoteRecord> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn should_fail(&self, point: FailPoint) -> bool {
        self.fail_at
            .lock()
            .map(|guard| *guard == Some(point))
            .unwrap_or(false)
    }

    fn lock_records(&self) -> Result<std::sync::MutexGuard<'_, Vec<RemoteRecord>>, SyncError> {
        self.records
            .lock()
            .map_err(|e| SyncError::Request(format!("remote state poisoned: {}", e)))
    }
}

#[async_trait]
impl RemoteCollaborator for InMemoryRemote {
    async fn fetch_all(&self) -> Result<Vec<RemoteRecord>, SyncError> {
        if self.should_fail(FailPoint::Fetch) {
            return Err(SyncError::Request("remote unreachable".to_string()));
        }
        Ok(self.lock_records()?.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), SyncError> {
        let n = self.deletes.fetch_add(1, Ordering::SeqCst) as usize;
        if self.should_fail(FailPoint::Delete(n)) {
            return Err(SyncError::Status {
                status: 500,
                body: "delete rejected".to_string(),
            });
        }

        let mut records = self.lock_records()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(SyncError::Status {
                status: 404,
                body: "Not found".to_string(),
            });
        }
        Ok(())
    }

    async fn create(&self, payload: &RemotePayload) -> Result<RemoteRecord, SyncError> {
        if self.stall_creates.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let n = self.creates.fetch_add(1, Ordering::SeqCst) as usize;
        if self.should_fail(FailPoint::Create(n)) {
            return Err(SyncError::Status {
                status: 400,
                body: "create rejected".to_string(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = payload.clone().into_record(id.to_string());
        self.lock_records()?.push(record.clone());
        Ok(record)
    }
}
