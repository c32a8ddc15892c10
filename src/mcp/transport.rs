//! MCP transport implementations.
//!
//! The SSE transport opens a long-lived event stream for server-to-client
//! messages and POSTs JSON-RPC to the endpoint the server announces in its
//! first event. Responses arrive on the event stream in arbitrary order and
//! are matched to callers solely by request id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, trace, warn};

use super::error::McpError;
use super::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId};

/// Trait for MCP transports.
///
/// A transport carries JSON-RPC traffic to one server. Concurrent `send`
/// calls are permitted; each response is matched to its caller by id.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send a request and wait for its correlated response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent, the connection is
    /// closed, or no response arrives within the transport's timeout.
    async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpError>;

    /// Send a notification. No response is expected.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification cannot be sent.
    async fn notify(&self, notification: JsonRpcNotification) -> Result<(), McpError>;

    /// Close the transport. Must be idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails to close cleanly.
    async fn close(&self) -> Result<(), McpError>;
}

/// In-flight requests awaiting responses, keyed by correlation id.
///
/// Factored out of the SSE transport so the matching rules (out-of-order
/// responses, timeouts, connection loss) are testable without a server.
#[derive(Default)]
pub struct PendingRequests {
    inner: Mutex<HashMap<RequestId, oneshot::Sender<JsonRpcResponse>>>,
}

impl PendingRequests {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request id and get the receiver its response will land on.
    pub async fn register(&self, id: RequestId) -> oneshot::Receiver<JsonRpcResponse> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().await.insert(id, tx);
        rx
    }

    /// Route a response to its waiting caller. Returns false when no caller
    /// is waiting on that id (late response after a timeout, or unsolicited).
    pub async fn complete(&self, response: JsonRpcResponse) -> bool {
        let sender = self.inner.lock().await.remove(&response.id);
        match sender {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    /// Drop a registration, e.g. after a send failure or timeout. A response
    /// arriving later for this id is discarded.
    pub async fn forget(&self, id: &RequestId) {
        self.inner.lock().await.remove(id);
    }

    /// Fail every outstanding request by dropping its sender. Callers
    /// observe a closed channel.
    pub async fn fail_all(&self) {
        self.inner.lock().await.clear();
    }

    /// Await a registered response, giving up after `timeout`.
    ///
    /// On timeout the registration is removed so a late response cannot
    /// leak, and subsequent requests are unaffected.
    ///
    /// # Errors
    ///
    /// [`McpError::Timeout`] when the deadline passes,
    /// [`McpError::ConnectionClosed`] when the sender was dropped.
    pub async fn wait(
        &self,
        id: &RequestId,
        rx: oneshot::Receiver<JsonRpcResponse>,
        timeout: Duration,
    ) -> Result<JsonRpcResponse, McpError> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(McpError::ConnectionClosed),
            Err(_) => {
                self.forget(id).await;
                Err(McpError::Timeout)
            }
        }
    }

    /// Number of in-flight requests.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// True when nothing is in flight.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

/// Configuration for the SSE transport.
#[derive(Debug, Clone)]
pub struct SseTransportConfig {
    /// How long to wait for the server to announce its message endpoint.
    pub connect_timeout: Duration,
    /// How long to wait for the response to any single request.
    pub request_timeout: Duration,
}

impl Default for SseTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// SSE transport for MCP servers.
///
/// Server-to-client traffic rides the event stream; client-to-server
/// traffic is POSTed to the endpoint the server names in its `endpoint`
/// event.
pub struct SseTransport {
    http: reqwest::Client,
    endpoint: url::Url,
    next_id: AtomicU64,
    pending: Arc<PendingRequests>,
    closed: Arc<AtomicBool>,
    stop_tx: mpsc::Sender<()>,
    request_timeout: Duration,
}

impl SseTransport {
    /// Open the event stream against `url` and wait for the server to
    /// announce its message endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened or the endpoint
    /// announcement does not arrive within the connect timeout.
    pub async fn connect(url: &str, config: SseTransportConfig) -> Result<Arc<Self>, McpError> {
        let base = url::Url::parse(url)
            .map_err(|e| McpError::transport(format!("invalid URL '{url}': {e}")))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| McpError::transport(format!("failed to build HTTP client: {e}")))?;

        let request = http.get(base.clone()).header("Accept", "text/event-stream");
        let mut events = EventSource::new(request)
            .map_err(|e| McpError::transport(format!("failed to open event stream: {e}")))?;

        let endpoint =
            tokio::time::timeout(config.connect_timeout, Self::await_endpoint(&mut events, &base))
                .await
                .map_err(|_| {
                    events.close();
                    McpError::transport("timed out waiting for endpoint announcement")
                })??;

        debug!(endpoint = %endpoint, "SSE transport connected");

        let pending = Arc::new(PendingRequests::new());
        let closed = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = mpsc::channel(1);

        tokio::spawn(Self::read_loop(
            events,
            Arc::clone(&pending),
            Arc::clone(&closed),
            stop_rx,
        ));

        Ok(Arc::new(Self {
            http,
            endpoint,
            next_id: AtomicU64::new(1),
            pending,
            closed,
            stop_tx,
            request_timeout: config.request_timeout,
        }))
    }

    /// Consume events until the server names its message endpoint.
    async fn await_endpoint(
        events: &mut EventSource,
        base: &url::Url,
    ) -> Result<url::Url, McpError> {
        while let Some(event) = events.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(message)) => {
                    if message.event == "endpoint" {
                        // The announced endpoint may be absolute or relative
                        // to the SSE URL.
                        return base.join(message.data.trim()).map_err(|e| {
                            McpError::protocol(format!(
                                "server announced invalid endpoint '{}': {e}",
                                message.data
                            ))
                        });
                    }
                    trace!(event = %message.event, "ignoring pre-endpoint event");
                }
                Err(e) => {
                    events.close();
                    return Err(McpError::transport(format!("event stream error: {e}")));
                }
            }
        }
        Err(McpError::ConnectionClosed)
    }

    /// Background task: route incoming responses to their callers until the
    /// stream ends or the transport is closed.
    async fn read_loop(
        mut events: EventSource,
        pending: Arc<PendingRequests>,
        closed: Arc<AtomicBool>,
        mut stop_rx: mpsc::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = stop_rx.recv() => {
                    events.close();
                    break;
                }
                event = events.next() => match event {
                    Some(Ok(Event::Open)) => {}
                    Some(Ok(Event::Message(message))) => {
                        if message.event != "message" {
                            trace!(event = %message.event, "ignoring event");
                            continue;
                        }
                        match serde_json::from_str::<JsonRpcResponse>(&message.data) {
                            Ok(response) => {
                                if !pending.complete(response).await {
                                    trace!("response with no waiting caller");
                                }
                            }
                            // Server-initiated requests and notifications
                            // also arrive here; we only correlate responses.
                            Err(e) => trace!(error = %e, "non-response message on stream"),
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "event stream failed");
                        events.close();
                        break;
                    }
                    None => break,
                }
            }
        }
        closed.store(true, Ordering::SeqCst);
        pending.fail_all().await;
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// True once the stream has ended or `close` has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn post(&self, body: String) -> Result<(), McpError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| McpError::transport(format!("POST failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::transport(format!("HTTP error {status}: {body}")));
        }
        Ok(())
    }
}

#[async_trait]
impl McpTransport for SseTransport {
    async fn send(&self, mut request: JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
        if self.is_closed() {
            return Err(McpError::ConnectionClosed);
        }

        let id = self.next_request_id();
        request.id = id.clone();

        // Register before POSTing so a fast response cannot race the waiter.
        let rx = self.pending.register(id.clone()).await;

        let body = serde_json::to_string(&request)?;
        trace!(method = %request.method, ?id, "sending request");
        if let Err(e) = self.post(body).await {
            self.pending.forget(&id).await;
            return Err(e);
        }

        self.pending.wait(&id, rx, self.request_timeout).await
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<(), McpError> {
        if self.is_closed() {
            return Err(McpError::ConnectionClosed);
        }
        let body = serde_json::to_string(&notification)?;
        trace!(method = %notification.method, "sending notification");
        self.post(body).await
    }

    async fn close(&self) -> Result<(), McpError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            // Reader may already be gone; nothing to signal then.
            let _ = self.stop_tx.send(()).await;
            self.pending.fail_all().await;
        }
        Ok(())
    }
}
