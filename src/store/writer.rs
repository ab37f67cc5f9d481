//! Store writer: single async task that serialises every mutation of the
//! account store.
//!
//! ```text
//! ipc set    ─┐
//! ipc remove ─┤       mpsc
//! cli        ─┼────→ channel ────→  writer task ──→ KeyringStore::set/remove
//! http       ─┘                         │
//!                                       ▼
//!                               oneshot ack per request
//! ```
//!
//! Callers await the ack, so a resolved `set`/`remove` means the backend has
//! applied (and for [`FileStore`](super::FileStore), fsynced) the change.
//! Reads bypass the writer and take the shared read lock directly.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::account::KeyringJson;
use crate::error::Result;
use crate::store::KeyringStore;

/// Shared handle through which readers query the store.
pub type SharedStore = Arc<RwLock<Box<dyn KeyringStore>>>;

/// A mutation to apply.
#[derive(Debug)]
pub enum WriteOp {
    Set { key: String, value: KeyringJson },
    Remove { key: String },
}

/// Payload sent to the writer task.
#[derive(Debug)]
pub struct WriteRequest {
    pub op: WriteOp,
    pub ack: oneshot::Sender<Result<()>>,
}

/// Create the writer channel and spawn the writer task.
///
/// Returns:
///   - `mpsc::Sender<WriteRequest>`, hand out clones to every caller.
///   - `JoinHandle` for the writer task; it finishes once every sender is dropped.
pub fn spawn_writer(
    store: SharedStore,
    channel_bound: usize,
) -> (mpsc::Sender<WriteRequest>, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<WriteRequest>(channel_bound);
    let handle = tokio::spawn(async move {
        writer_loop(store, rx).await;
    });
    (tx, handle)
}

async fn writer_loop(store: SharedStore, mut rx: mpsc::Receiver<WriteRequest>) {
    info!("Store writer started");

    while let Some(req) = rx.recv().await {
        let result = match &req.op {
            WriteOp::Set { key, value } => store.write().set(key, value),
            WriteOp::Remove { key } => store.write().remove(key),
        };

        match &result {
            Ok(()) => debug!(op = ?op_name(&req.op), "Write applied"),
            Err(e) => error!(op = ?op_name(&req.op), error = %e, "Write failed"),
        }

        // Caller may have given up waiting; the write stands regardless.
        let _ = req.ack.send(result);
    }

    info!("Store writer shutting down (channel closed)");
}

fn op_name(op: &WriteOp) -> (&'static str, &str) {
    match op {
        WriteOp::Set { key, .. } => ("set", key),
        WriteOp::Remove { key } => ("remove", key),
    }
}
