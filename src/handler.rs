//! Typed account-store operations: reads go straight to the shared store,
//! writes are queued on the store writer and awaited.

use tokio::sync::{mpsc, oneshot};

use crate::account::{KeyringJson, StoreEntry};
use crate::error::{Result, StoreError};
use crate::store::validate_key;
use crate::store::writer::{SharedStore, WriteOp, WriteRequest};

/// Cheap to clone; every clone feeds the same writer.
#[derive(Clone)]
pub struct AccountStoreHandler {
    store: SharedStore,
    writer_tx: mpsc::Sender<WriteRequest>,
}

impl AccountStoreHandler {
    pub fn new(store: SharedStore, writer_tx: mpsc::Sender<WriteRequest>) -> Self {
        Self { store, writer_tx }
    }

    /// Every persisted record, in insertion order.
    pub fn all(&self) -> Result<Vec<StoreEntry>> {
        self.store.read().all()
    }

    /// The record under `key`, `None` if absent.
    pub async fn get(&self, key: &str) -> Result<Option<KeyringJson>> {
        self.store.read().get(key)
    }

    /// Persist or overwrite `key`. Resolves once the write is durable.
    pub async fn set(&self, key: &str, value: KeyringJson) -> Result<()> {
        validate_key(key)?;
        self.submit(WriteOp::Set {
            key: key.to_string(),
            value,
        })
        .await
    }

    /// Delete `key`; a missing key is a no-op.
    pub async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.submit(WriteOp::Remove {
            key: key.to_string(),
        })
        .await
    }

    /// Number of records `all()` would return.
    pub fn count(&self) -> Result<usize> {
        self.store.read().count()
    }

    async fn submit(&self, op: WriteOp) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.writer_tx
            .send(WriteRequest { op, ack })
            .await
            .map_err(|_| StoreError::WriterClosed)?;
        done.await.map_err(|_| StoreError::WriterClosed)?
    }
}
