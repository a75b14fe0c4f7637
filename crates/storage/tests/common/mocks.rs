use async_trait::async_trait;
use bytes::Bytes;
use ota_storage::error::{StorageError, StorageResult};
use ota_storage::traits::{ObjectMeta, ObjectStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use time::OffsetDateTime;
use tokio::sync::Barrier;

/// In-memory backend that records calls.
///
/// When `rendezvous` is set, `get` and `head` each wait on a shared barrier,
/// so a caller issuing them one after the other never completes.
#[allow(dead_code)]
pub struct InstrumentedBackend {
    objects: Mutex<HashMap<String, Bytes>>,
    pub last_modified: Option<OffsetDateTime>,
    pub calls: AtomicUsize,
    rendezvous: Option<Arc<Barrier>>,
}

#[allow(dead_code)]
impl InstrumentedBackend {
    pub fn new(last_modified: Option<OffsetDateTime>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            last_modified,
            calls: AtomicUsize::new(0),
            rendezvous: None,
        }
    }

    pub fn with_rendezvous(mut self) -> Self {
        self.rendezvous = Some(Arc::new(Barrier::new(2)));
        self
    }

    pub fn insert(&self, key: &str, data: &'static [u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::from_static(data));
    }

    fn lookup(&self, key: &str) -> StorageResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn meet(&self) {
        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
    }
}

#[async_trait]
impl ObjectStore for InstrumentedBackend {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.lookup(key).is_ok())
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        self.meet().await;
        let data = self.lookup(key)?;
        Ok(ObjectMeta {
            size: data.len() as u64,
            last_modified: self.last_modified,
            content_type: None,
        })
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.meet().await;
        self.lookup(key)
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "instrumented"
    }
}
