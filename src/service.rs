// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Account service: owns the store backend, the writer task and the IPC
//! registry built on top of them.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{Backend, StoreConfig};
use crate::error::Result;
use crate::handler::AccountStoreHandler;
use crate::ipc::{account_store_ipc_handler, IpcMainHandler};
use crate::store::writer::{self, SharedStore};
use crate::store::{FileStore, KeyringStore, MemoryStore};

/// How long shutdown waits for queued writes before aborting the writer.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Top-level service. Must be created inside a tokio runtime.
pub struct AccountService {
    /// Typed operations.
    pub handler: AccountStoreHandler,
    /// Channel registry wired to `handler`.
    pub ipc: IpcMainHandler,
    /// Shared store, also used for status reporting.
    pub store: SharedStore,
    writer_handle: JoinHandle<()>,
}

impl AccountService {
    /// Open the configured backend and start the writer.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let store: Box<dyn KeyringStore> = match config.backend {
            Backend::File => Box::new(FileStore::open(&config.base_path)?),
            Backend::Memory => Box::new(MemoryStore::new()),
        };
        info!(
            backend = ?config.backend,
            base_path = ?config.base_path,
            queue = config.writer_queue_size,
            "Account store ready"
        );
        Ok(Self::with_store(store, config.writer_queue_size))
    }

    /// Wrap an already constructed backend.
    pub fn with_store(store: Box<dyn KeyringStore>, writer_queue_size: usize) -> Self {
        let store: SharedStore = Arc::new(RwLock::new(store));
        let (writer_tx, writer_handle) = writer::spawn_writer(store.clone(), writer_queue_size);
        let handler = AccountStoreHandler::new(store.clone(), writer_tx);
        let ipc = account_store_ipc_handler(handler.clone());

        AccountService {
            handler,
            ipc,
            store,
            writer_handle,
        }
    }

    /// Drop this service's senders and wait for the writer to drain.
    /// Clones of the handler still alive elsewhere keep the writer open, in
    /// which case it is aborted after [`WRITER_DRAIN_TIMEOUT`].
    pub async fn shutdown(self) {
        self.shutdown_within(WRITER_DRAIN_TIMEOUT).await
    }

    /// [`shutdown`](Self::shutdown) with an explicit drain timeout.
    pub async fn shutdown_within(self, drain_timeout: Duration) {
        info!("Account service shutting down…");
        drop(self.handler);
        drop(self.ipc);

        let mut handle = self.writer_handle;
        match tokio::time::timeout(drain_timeout, &mut handle).await {
            Ok(_) => info!("Store writer stopped"),
            Err(_) => {
                warn!("Store writer still referenced, aborting");
                handle.abort();
            }
        }
    }
}
