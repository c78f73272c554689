//! Injected wallet provider

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// RPC-style entry point exposed by a wallet extension
#[async_trait]
pub trait InjectedProvider: Send + Sync {
    /// Call a provider method with JSON parameters
    async fn send(&self, method: &str, params: Value) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct ProviderCall<'a> {
    method: &'a str,
    params: &'a Value,
}

/// Encode one native-messaging frame: the JSON length as a native-endian
/// `u32`, then the JSON itself
pub fn encode_frame(method: &str, params: &Value) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(&ProviderCall { method, params })
        .map_err(|e| Error::Serialization(format!("Failed to encode provider call: {}", e)))?;
    let len = u32::try_from(json.len())
        .map_err(|_| Error::Provider(format!("Provider call too large: {} bytes", json.len())))?;

    let mut frame = Vec::with_capacity(4 + json.len());
    frame.extend_from_slice(&len.to_ne_bytes());
    frame.extend_from_slice(&json);
    Ok(frame)
}

/// Provider reached over a browser native-messaging channel
pub struct NativeMessagingProvider<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> NativeMessagingProvider<W> {
    /// Write frames to the given channel
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Take back the underlying writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl NativeMessagingProvider<tokio::io::Stdout> {
    /// Native hosts talk to the browser over stdout
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> InjectedProvider for NativeMessagingProvider<W> {
    async fn send(&self, method: &str, params: Value) -> Result<()> {
        let frame = encode_frame(method, &params)?;
        debug!(method, bytes = frame.len(), "Writing native messaging frame");

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&frame)
            .await
            .map_err(|e| Error::Provider(format!("Failed to write to provider: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| Error::Provider(format!("Failed to flush provider channel: {}", e)))
    }
}
