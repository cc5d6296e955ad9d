// Batch storage
//
// Batches are kept behind a versioned compare-and-swap interface so that the
// aggregator can run optimistic read-modify-write cycles per batch key. The
// version lives on the batch itself and is bumped by every mutation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::batches::{Batch, BatchError, BatchKey, BatchResult};

/// Per-batch write counter, see [`Batch::touch`]
pub type Version = u64;

/// Storage seam used by the batch aggregator
pub trait BatchStore: Send + Sync {
    fn load(&self, key: &BatchKey) -> BatchResult<Option<Batch>>;

    fn load_by_id(&self, id: Uuid) -> BatchResult<Option<Batch>>;

    /// Replace the batch under `key` if its current version is `expected`.
    ///
    /// `expected = None` means the key must be vacant; `next = None` deletes
    /// the batch. Returns `Ok(false)` when the version check fails.
    fn compare_and_swap(
        &self,
        key: &BatchKey,
        expected: Option<Version>,
        next: Option<Batch>,
    ) -> BatchResult<bool>;

    fn list(&self) -> BatchResult<Vec<Batch>>;
}

#[derive(Debug, Default)]
struct StoreInner {
    batches: HashMap<BatchKey, Batch>,
    keys_by_id: HashMap<Uuid, BatchKey>,
}

/// Process-local batch store
#[derive(Debug, Default)]
pub struct InMemoryBatchStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> BatchResult<MutexGuard<'_, StoreInner>> {
        self.inner
            .lock()
            .map_err(|_| BatchError::Store("batch store lock poisoned".to_string()))
    }
}

impl BatchStore for InMemoryBatchStore {
    fn load(&self, key: &BatchKey) -> BatchResult<Option<Batch>> {
        Ok(self.lock()?.batches.get(key).cloned())
    }

    fn load_by_id(&self, id: Uuid) -> BatchResult<Option<Batch>> {
        let inner = self.lock()?;
        Ok(inner
            .keys_by_id
            .get(&id)
            .and_then(|key| inner.batches.get(key))
            .cloned())
    }

    fn compare_and_swap(
        &self,
        key: &BatchKey,
        expected: Option<Version>,
        next: Option<Batch>,
    ) -> BatchResult<bool> {
        let mut inner = self.lock()?;

        let current = inner.batches.get(key).map(|stored| stored.version);
        if current != expected {
            return Ok(false);
        }

        match next {
            Some(batch) => {
                if expected.is_some_and(|version| batch.version <= version) {
                    return Err(BatchError::Store(format!(
                        "batch {} written without a newer version",
                        batch.id
                    )));
                }
                inner.keys_by_id.insert(batch.id, key.clone());
                inner.batches.insert(key.clone(), batch);
            }
            None => {
                if let Some(removed) = inner.batches.remove(key) {
                    inner.keys_by_id.remove(&removed.id);
                }
            }
        }

        Ok(true)
    }

    fn list(&self) -> BatchResult<Vec<Batch>> {
        let inner = self.lock()?;
        let mut batches: Vec<Batch> = inner.batches.values().cloned().collect();
        batches.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(batches)
    }
}
