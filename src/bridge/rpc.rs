//! Shared JSON-RPC types for bridge communication
//!
//! Process-backed bridges speak newline-delimited JSON-RPC 2.0 over the
//! child's stdin/stdout.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};

use super::BridgeError;

/// Error code the helper uses for engine timeouts
pub const TIMEOUT_ERROR_CODE: i32 = -32001;

/// JSON-RPC request
#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: u64,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl From<RpcError> for BridgeError {
    fn from(err: RpcError) -> Self {
        if err.code == TIMEOUT_ERROR_CODE {
            BridgeError::Timeout
        } else {
            BridgeError::ServerError(format!("[{}] {}", err.code, err.message))
        }
    }
}

/// Request sender type alias
pub type RequestSender = mpsc::Sender<(RpcRequest, oneshot::Sender<Result<Value, BridgeError>>)>;

/// Request receiver type alias
pub type RequestReceiver =
    mpsc::Receiver<(RpcRequest, oneshot::Sender<Result<Value, BridgeError>>)>;

/// Global request ID counter
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Create a new RPC request with auto-incremented ID
pub fn new_request(method: &str, params: Value) -> RpcRequest {
    RpcRequest {
        jsonrpc: "2.0",
        id: REQUEST_ID.fetch_add(1, Ordering::SeqCst),
        method: method.to_string(),
        params,
    }
}

/// Send an RPC request and wait for response
pub async fn send_request(
    request_tx: &RequestSender,
    method: &str,
    params: Value,
) -> Result<Value, BridgeError> {
    let req = new_request(method, params);
    let (tx, rx) = oneshot::channel();

    request_tx
        .send((req, tx))
        .await
        .map_err(|_| BridgeError::Disconnected)?;

    rx.await.map_err(|_| BridgeError::Disconnected)?
}

/// Spawn the background communication task for JSON-RPC over a byte stream.
///
/// When the stream closes, every pending request resolves to `Disconnected`.
pub fn spawn_communication_task<W, R>(mut request_rx: RequestReceiver, writer: W, reader: R)
where
    W: AsyncWrite + Unpin + Send + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut writer = writer;
        let mut reader = BufReader::new(reader);
        let mut pending: HashMap<u64, oneshot::Sender<Result<Value, BridgeError>>> = HashMap::new();
        let mut line = String::new();

        loop {
            tokio::select! {
                request = request_rx.recv() => {
                    match request {
                        Some((req, response_tx)) => {
                            let id = req.id;
                            let json = match serde_json::to_string(&req) {
                                Ok(json) => json + "\n",
                                Err(e) => {
                                    let _ = response_tx.send(Err(e.into()));
                                    continue;
                                }
                            };
                            if writer.write_all(json.as_bytes()).await.is_err()
                                || writer.flush().await.is_err()
                            {
                                let _ = response_tx.send(Err(BridgeError::Disconnected));
                                break;
                            }
                            pending.insert(id, response_tx);
                        }
                        None => break,
                    }
                }

                result = reader.read_line(&mut line) => {
                    match result {
                        Ok(0) => break,
                        Ok(_) => {
                            match serde_json::from_str::<RpcResponse>(&line) {
                                Ok(response) => {
                                    if let Some(tx) = pending.remove(&response.id) {
                                        let result = match response.error {
                                            Some(err) => Err(err.into()),
                                            None => Ok(response.result.unwrap_or(Value::Null)),
                                        };
                                        let _ = tx.send(result);
                                    }
                                }
                                Err(_) => tracing::debug!(line = %line.trim_end(), "Ignoring non-RPC output"),
                            }
                            line.clear();
                        }
                        Err(_) => break,
                    }
                }
            }
        }

        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(BridgeError::Disconnected));
        }
    });
}
