//! Shared mocks for exercising the session layer without a server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::Mutex;

use super::error::McpError;
use super::protocol::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
    JSONRPC_VERSION,
};
use super::transport::McpTransport;

type Handler =
    Box<dyn Fn(JsonRpcRequest) -> BoxFuture<'static, Result<JsonRpcResponse, McpError>> + Send + Sync>;

/// One scripted outcome for a `send` call.
pub struct ScriptedReply(ReplyKind);

enum ReplyKind {
    Result(Value),
    Error(JsonRpcError),
    Timeout,
    Transport(String),
}

impl ScriptedReply {
    /// Reply with a successful result payload.
    pub fn result(value: Value) -> Self {
        Self(ReplyKind::Result(value))
    }

    /// Reply with a JSON-RPC error object.
    pub fn error(error: JsonRpcError) -> Self {
        Self(ReplyKind::Error(error))
    }

    /// Simulate a response that never arrives.
    pub fn timeout() -> Self {
        Self(ReplyKind::Timeout)
    }

    /// Simulate a transport failure.
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self(ReplyKind::Transport(message.into()))
    }

    fn into_response(self, id: RequestId) -> Result<JsonRpcResponse, McpError> {
        match self.0 {
            ReplyKind::Result(value) => Ok(JsonRpcResponse {
                jsonrpc: JSONRPC_VERSION.to_string(),
                result: Some(value),
                error: None,
                id,
            }),
            ReplyKind::Error(error) => Ok(JsonRpcResponse {
                jsonrpc: JSONRPC_VERSION.to_string(),
                result: None,
                error: Some(error),
                id,
            }),
            ReplyKind::Timeout => Err(McpError::Timeout),
            ReplyKind::Transport(message) => Err(McpError::Transport(message)),
        }
    }
}

/// Transport double that replays scripted replies in order, then falls back
/// to an optional handler. Records everything sent and counts closes.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<ScriptedReply>>,
    handler: std::sync::Mutex<Option<Handler>>,
    sent: Mutex<Vec<String>>,
    notified: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    close_calls: AtomicUsize,
}

impl MockTransport {
    /// Create an empty mock.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue more scripted replies.
    pub async fn push(&self, replies: Vec<ScriptedReply>) {
        self.replies.lock().await.extend(replies);
    }

    /// Install a fallback handler used once the scripted queue is empty.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(JsonRpcRequest) -> BoxFuture<'static, Result<JsonRpcResponse, McpError>>
            + Send
            + Sync
            + 'static,
    {
        *self.handler.lock().expect("handler lock") = Some(Box::new(handler));
    }

    /// Methods of every request sent, in order.
    pub async fn sent_methods(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }

    /// Methods of every notification sent, in order.
    pub async fn sent_notifications(&self) -> Vec<String> {
        self.notified.lock().await.clone()
    }

    /// How many times `close` has been called.
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl McpTransport for MockTransport {
    async fn send(&self, mut request: JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64;
        request.id = RequestId::Number(id);
        self.sent.lock().await.push(request.method.clone());

        let scripted = self.replies.lock().await.pop_front();
        if let Some(reply) = scripted {
            return reply.into_response(request.id);
        }

        let fut = {
            let guard = self.handler.lock().expect("handler lock");
            guard.as_ref().map(|h| h(request))
        };
        match fut {
            Some(fut) => fut.await,
            None => Err(McpError::transport("mock transport: no scripted reply")),
        }
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<(), McpError> {
        self.notified.lock().await.push(notification.method);
        Ok(())
    }

    async fn close(&self) -> Result<(), McpError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Shorthand: a mock preloaded with `replies`.
pub fn script(replies: Vec<ScriptedReply>) -> Arc<MockTransport> {
    let transport = MockTransport::new();
    transport
        .replies
        .try_lock()
        .expect("fresh mock")
        .extend(replies);
    transport
}
