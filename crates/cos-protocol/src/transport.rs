//! Correlated request/response transport across the isolation boundary.
//!
//! The requesting side holds a [`ChannelTransport`]; the storage side drains
//! a [`HostEndpoint`] with [`serve`]. Frames are [`CosCodec`]-encoded
//! envelopes carried as [`Bytes`] over tokio channels.
//!
//! Every request is tagged with a fresh id and a response is delivered only
//! to the request whose id it echoes, so concurrent calls for the same
//! action cannot steal each other's replies. Replies for unknown or
//! abandoned ids are discarded and counted as mismatches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::codec::CosCodec;
use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{codes, Action, CosMessage, Envelope};

/// Sends one request and waits for its response.
///
/// There is no built-in timeout: a request waits until the remote side
/// answers or the channel closes. Callers that need bounded latency wrap the
/// future in their own timeout; dropping it abandons the request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The origin stamped on every outgoing envelope.
    fn origin(&self) -> &str;

    /// Send a request message and return the matching response.
    ///
    /// A [`CosMessage::Error`] reply is surfaced as
    /// [`ProtocolError::RemoteError`].
    async fn send(&self, message: CosMessage) -> ProtocolResult<CosMessage>;
}

/// Answers requests on the storage side.
#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    async fn handle(&self, origin: &str, message: CosMessage) -> CosMessage;
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters kept by a [`ChannelTransport`].
#[derive(Debug, Default)]
pub struct TransportMetrics {
    pub requests_sent: AtomicU64,
    pub responses_delivered: AtomicU64,
    pub mismatches: AtomicU64,
}

impl TransportMetrics {
    fn record_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    fn record_delivered(&self) {
        self.responses_delivered.fetch_add(1, Ordering::Relaxed);
    }

    fn record_mismatch(&self) {
        self.mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mismatch_count(&self) -> u64 {
        self.mismatches.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Requesting side
// ---------------------------------------------------------------------------

struct Pending {
    action: Action,
    reply: oneshot::Sender<ProtocolResult<CosMessage>>,
}

type PendingMap = Arc<Mutex<HashMap<u64, Pending>>>;

/// Removes an abandoned request from the pending map when its `send`
/// future is dropped before a reply arrives.
struct PendingGuard {
    id: u64,
    pending: PendingMap,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Ok(mut map) = self.pending.lock() {
            if map.remove(&self.id).is_some() {
                debug!(id = self.id, "request abandoned before reply");
            }
        }
    }
}

/// Requesting half of an in-process boundary.
pub struct ChannelTransport {
    origin: String,
    next_id: AtomicU64,
    outbound: mpsc::Sender<Bytes>,
    pending: PendingMap,
    metrics: Arc<TransportMetrics>,
    router: JoinHandle<()>,
}

impl ChannelTransport {
    /// Wrap a pair of frame channels. Spawns the response router, so this
    /// must be called from within a tokio runtime.
    pub fn new(
        origin: impl Into<String>,
        outbound: mpsc::Sender<Bytes>,
        inbound: mpsc::Receiver<Bytes>,
    ) -> Self {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let metrics = Arc::new(TransportMetrics::default());
        let router = tokio::spawn(route_responses(inbound, pending.clone(), metrics.clone()));
        Self {
            origin: origin.into(),
            next_id: AtomicU64::new(1),
            outbound,
            pending,
            metrics,
            router,
        }
    }

    pub fn metrics(&self) -> &TransportMetrics {
        &self.metrics
    }

    /// Requests sent but not yet answered or abandoned.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|map| map.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn send(&self, message: CosMessage) -> ProtocolResult<CosMessage> {
        if !message.is_request() {
            return Err(ProtocolError::InvalidMessage(format!(
                "{} is not a request",
                message.type_name()
            )));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let action = message.action();
        let frame = CosCodec::encode(&Envelope::new(id, self.origin.clone(), message))?;

        let (reply, response) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| ProtocolError::ChannelClosed)?
            .insert(id, Pending { action, reply });
        let _guard = PendingGuard {
            id,
            pending: self.pending.clone(),
        };

        debug!(id, %action, bytes = frame.len(), "sending request");
        self.outbound
            .send(Bytes::from(frame))
            .await
            .map_err(|_| ProtocolError::ChannelClosed)?;
        self.metrics.record_sent();

        match response.await.map_err(|_| ProtocolError::ChannelClosed)?? {
            CosMessage::Error { code, message, .. } => {
                Err(ProtocolError::RemoteError { code, message })
            }
            other => Ok(other),
        }
    }
}

impl Drop for ChannelTransport {
    fn drop(&mut self) {
        self.router.abort();
    }
}

async fn route_responses(
    mut inbound: mpsc::Receiver<Bytes>,
    pending: PendingMap,
    metrics: Arc<TransportMetrics>,
) {
    while let Some(frame) = inbound.recv().await {
        match CosCodec::decode(&frame) {
            Ok((envelope, _)) => deliver(&pending, &metrics, envelope),
            Err(e) => {
                metrics.record_mismatch();
                warn!(error = %e, "discarding undecodable response frame");
            }
        }
    }
    debug!("response channel closed");
    // Dropping the senders wakes every waiter with `ChannelClosed`.
    if let Ok(mut map) = pending.lock() {
        map.clear();
    }
}

fn deliver(pending: &PendingMap, metrics: &TransportMetrics, envelope: Envelope) {
    let entry = match pending.lock() {
        Ok(mut map) => map.remove(&envelope.id),
        Err(_) => return,
    };
    let Some(Pending { action, reply }) = entry else {
        metrics.record_mismatch();
        warn!(
            id = envelope.id,
            action = %envelope.action(),
            "transport mismatch: no pending request for response, discarded"
        );
        return;
    };

    if envelope.message.answers(action) {
        metrics.record_delivered();
        let _ = reply.send(Ok(envelope.message));
    } else {
        metrics.record_mismatch();
        warn!(
            id = envelope.id,
            expected = %action,
            actual = envelope.message.type_name(),
            "transport mismatch: response does not answer its request"
        );
        let _ = reply.send(Err(ProtocolError::TransportMismatch {
            expected: action,
            actual: envelope.message.type_name().to_string(),
        }));
    }
}

// ---------------------------------------------------------------------------
// Storage side
// ---------------------------------------------------------------------------

/// Storage-owning half of an in-process boundary.
pub struct HostEndpoint {
    inbound: mpsc::Receiver<Bytes>,
    outbound: mpsc::Sender<Bytes>,
}

/// Create a connected requester/host pair with `capacity` frames of
/// buffering in each direction.
pub fn in_process_pair(origin: impl Into<String>, capacity: usize) -> (ChannelTransport, HostEndpoint) {
    let (to_host, from_requester) = mpsc::channel(capacity);
    let (to_requester, from_host) = mpsc::channel(capacity);
    let transport = ChannelTransport::new(origin, to_host, from_host);
    let endpoint = HostEndpoint {
        inbound: from_requester,
        outbound: to_requester,
    };
    (transport, endpoint)
}

/// Decode one request frame, run it through `handler`, and encode the reply.
///
/// Frames are answered even when malformed as long as an envelope can be
/// decoded; a non-request message gets a `400` error reply.
pub async fn handle_frame<H>(handler: &H, frame: &[u8]) -> ProtocolResult<Vec<u8>>
where
    H: EnvelopeHandler + ?Sized,
{
    let (envelope, _) = CosCodec::decode(frame)?;
    let response = if envelope.message.is_request() {
        handler
            .handle(&envelope.origin, envelope.message.clone())
            .await
    } else {
        CosMessage::Error {
            action: envelope.action(),
            code: codes::BAD_REQUEST,
            message: format!("{} is not a request", envelope.message.type_name()),
        }
    };
    CosCodec::encode(&envelope.reply(response))
}

/// Answer requests from `endpoint` one at a time, in arrival order, until
/// the requesting side hangs up.
pub async fn serve<H>(mut endpoint: HostEndpoint, handler: Arc<H>)
where
    H: EnvelopeHandler + ?Sized,
{
    while let Some(frame) = endpoint.inbound.recv().await {
        match handle_frame(handler.as_ref(), &frame).await {
            Ok(reply) => {
                if endpoint.outbound.send(Bytes::from(reply)).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!(error = %e, "dropping undecodable request frame"),
        }
    }
    debug!("host endpoint closed");
}
