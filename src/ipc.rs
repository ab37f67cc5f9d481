//! Named-channel dispatch.
//!
//! Channels:
//!   account-store-all     []              → [{key, value}, …]
//!   account-store-get     [key]           → value | null
//!   account-store-set     [key, value]    → null
//!   account-store-remove  [key]           → null

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::account::KeyringJson;
use crate::error::{Result, StoreError};
use crate::handler::AccountStoreHandler;

pub const CHANNEL_ALL: &str = "account-store-all";
pub const CHANNEL_GET: &str = "account-store-get";
pub const CHANNEL_SET: &str = "account-store-set";
pub const CHANNEL_REMOVE: &str = "account-store-remove";

pub type IpcFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;
type IpcHandlerFn = Arc<dyn Fn(Vec<Value>) -> IpcFuture + Send + Sync>;

/// Registry of channel name → async handler taking the call's JSON arguments.
#[derive(Clone, Default)]
pub struct IpcMainHandler {
    handlers: BTreeMap<String, IpcHandlerFn>,
}

impl IpcMainHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `channel`, replacing any previous handler.
    pub fn register<F>(&mut self, channel: &str, f: F)
    where
        F: Fn(Vec<Value>) -> IpcFuture + Send + Sync + 'static,
    {
        self.handlers.insert(channel.to_string(), Arc::new(f));
    }

    /// Registered channel names, sorted.
    pub fn channels(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.handlers.contains_key(channel)
    }

    /// Dispatch one call.
    pub async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value> {
        let handler = self
            .handlers
            .get(channel)
            .cloned()
            .ok_or_else(|| StoreError::UnknownChannel {
                channel: channel.to_string(),
            })?;
        debug!(channel, args = args.len(), "IPC call");
        handler(args).await
    }
}

/// Expose `store` on the four `account-store-*` channels.
pub fn account_store_ipc_handler(store: AccountStoreHandler) -> IpcMainHandler {
    let mut ipc = IpcMainHandler::new();

    let h = store.clone();
    ipc.register(CHANNEL_ALL, move |args: Vec<Value>| -> IpcFuture {
        let h = h.clone();
        Box::pin(async move {
            expect_arity(CHANNEL_ALL, &args, 0)?;
            Ok(serde_json::to_value(h.all()?)?)
        })
    });

    let h = store.clone();
    ipc.register(CHANNEL_GET, move |args: Vec<Value>| -> IpcFuture {
        let h = h.clone();
        Box::pin(async move {
            expect_arity(CHANNEL_GET, &args, 1)?;
            let key = key_arg(CHANNEL_GET, &args)?;
            Ok(serde_json::to_value(h.get(key).await?)?)
        })
    });

    let h = store.clone();
    ipc.register(CHANNEL_SET, move |args: Vec<Value>| -> IpcFuture {
        let h = h.clone();
        Box::pin(async move {
            expect_arity(CHANNEL_SET, &args, 2)?;
            let key = key_arg(CHANNEL_SET, &args)?;
            let value: KeyringJson =
                serde_json::from_value(args[1].clone()).map_err(|e| StoreError::InvalidArgs {
                    channel: CHANNEL_SET.to_string(),
                    reason: format!("value is not an account record: {e}"),
                })?;
            h.set(key, value).await?;
            Ok(Value::Null)
        })
    });

    let h = store;
    ipc.register(CHANNEL_REMOVE, move |args: Vec<Value>| -> IpcFuture {
        let h = h.clone();
        Box::pin(async move {
            expect_arity(CHANNEL_REMOVE, &args, 1)?;
            let key = key_arg(CHANNEL_REMOVE, &args)?;
            h.remove(key).await?;
            Ok(Value::Null)
        })
    });

    ipc
}

fn expect_arity(channel: &str, args: &[Value], n: usize) -> Result<()> {
    if args.len() != n {
        return Err(StoreError::InvalidArgs {
            channel: channel.to_string(),
            reason: format!("expected {n} argument(s), got {}", args.len()),
        });
    }
    Ok(())
}

fn key_arg<'a>(channel: &str, args: &'a [Value]) -> Result<&'a str> {
    args[0].as_str().ok_or_else(|| StoreError::InvalidArgs {
        channel: channel.to_string(),
        reason: "key must be a string".into(),
    })
}
