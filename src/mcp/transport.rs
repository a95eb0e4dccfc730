// Copyright 2025 Toolbridge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! MCP stdio transport with newline-delimited JSON framing.

use crate::mcp::handlers::McpHandler;
use crate::mcp::protocol::{JsonRpcError, JsonRpcId, JsonRpcRequest, JsonRpcResponse};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Channel closed")]
    ChannelClosed,
}

/// Transport abstraction for MCP messages. `recv` yields raw lines so the
/// serve loop can distinguish requests from id-less notifications;
/// `Ok(None)` means the peer closed the stream.
#[async_trait::async_trait]
pub trait McpTransport: Send {
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;
    async fn send(&mut self, response: &JsonRpcResponse) -> Result<(), TransportError>;
}

/// Stdio transport, one JSON message per line.
pub struct StdioTransport {
    reader: BufReader<tokio::io::Stdin>,
    writer: BufWriter<tokio::io::Stdout>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: BufWriter::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl McpTransport for StdioTransport {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    async fn send(&mut self, response: &JsonRpcResponse) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(response)?;
        self.writer.write_all(&payload).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Channel-backed transport for tests and in-process use.
pub struct BufferTransport {
    input: Mutex<mpsc::Receiver<String>>,
    output: mpsc::Sender<JsonRpcResponse>,
}

impl BufferTransport {
    pub fn new(input: mpsc::Receiver<String>, output: mpsc::Sender<JsonRpcResponse>) -> Self {
        Self {
            input: Mutex::new(input),
            output,
        }
    }
}

#[async_trait::async_trait]
impl McpTransport for BufferTransport {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        let mut guard = self.input.lock().await;
        Ok(guard.recv().await)
    }

    async fn send(&mut self, response: &JsonRpcResponse) -> Result<(), TransportError> {
        self.output
            .send(response.clone())
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Run the handler over a transport until the peer disconnects.
///
/// Notifications (messages without an id) are consumed without a reply, as
/// JSON-RPC requires. Unparseable lines produce a parse error response with
/// a null id.
pub async fn serve(
    mut transport: impl McpTransport,
    handler: &McpHandler,
) -> Result<(), TransportError> {
    info!("MCP transport serving");
    while let Some(line) = transport.recv().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Unparseable MCP message");
                let response = JsonRpcResponse::error(
                    JsonRpcId::Null,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                );
                transport.send(&response).await?;
                continue;
            }
        };

        if value.get("id").is_none() {
            debug!(
                method = value.get("method").and_then(|m| m.as_str()).unwrap_or("?"),
                "notification received"
            );
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                let response = JsonRpcResponse::error(
                    JsonRpcId::Null,
                    JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
                );
                transport.send(&response).await?;
                continue;
            }
        };

        let response = handler.handle_request(request).await;
        transport.send(&response).await?;
    }
    info!("MCP transport closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{OptimizePromptTool, ToolRegistry};
    use std::sync::Arc;

    fn handler() -> McpHandler {
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(Arc::new(OptimizePromptTool::new()))
            .unwrap();
        McpHandler::new(registry)
    }

    #[tokio::test]
    async fn test_serve_answers_requests_in_order() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let transport = BufferTransport::new(in_rx, out_tx);
        let handler = handler();

        in_tx
            .send(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#.to_string())
            .await
            .unwrap();
        in_tx
            .send(r#"{"jsonrpc":"2.0","method":"tools/list","id":2}"#.to_string())
            .await
            .unwrap();
        drop(in_tx);

        serve(transport, &handler).await.unwrap();

        let first = out_rx.recv().await.unwrap();
        assert_eq!(first.id, JsonRpcId::Number(1));
        let second = out_rx.recv().await.unwrap();
        assert_eq!(second.id, JsonRpcId::Number(2));
        assert!(second.result.is_some());
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let transport = BufferTransport::new(in_rx, out_tx);
        let handler = handler();

        in_tx
            .send(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_string())
            .await
            .unwrap();
        in_tx
            .send(r#"{"jsonrpc":"2.0","method":"ping","id":7}"#.to_string())
            .await
            .unwrap();
        drop(in_tx);

        serve(transport, &handler).await.unwrap();

        // Only the ping got an answer.
        let only = out_rx.recv().await.unwrap();
        assert_eq!(only.id, JsonRpcId::Number(7));
        assert!(out_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_bad_json_yields_parse_error() {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let transport = BufferTransport::new(in_rx, out_tx);
        let handler = handler();

        in_tx.send("{not json".to_string()).await.unwrap();
        drop(in_tx);

        serve(transport, &handler).await.unwrap();

        let response = out_rx.recv().await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
    }
}
