use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use devnet_core::CoreError;
use devnet_core::Reading;
use devnet_core::Result;
use devnet_core::SubscriptionDispatcher;
use futures::SinkExt;
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::envelope::Request;
use crate::envelope::Response;

enum Pending {
    OneShot(oneshot::Sender<Response>),
    Subscription(SubscriptionDispatcher),
}

struct Shared {
    pending: Mutex<HashMap<u64, Pending>>,
}

/// One long-lived duplex connection to the data-pool manager. The backend
/// owns the wire; callers never see the raw socket, only the correlated
/// responses and subscription dispatches this connection routes to them.
pub struct DpmConnection {
    sink: Mutex<futures::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
        Message,
    >>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
}

impl DpmConnection {
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| CoreError::Other(format!("dpm connect failed: {e}")))?;
        let (sink, mut source) = stream.split();
        let shared = Arc::new(Shared { pending: Mutex::new(HashMap::new()) });

        let read_shared = shared.clone();
        tokio::spawn(async move {
            while let Some(msg) = source.next().await {
                let Ok(Message::Text(text)) = msg else {
                    break;
                };
                let Ok(response) = serde_json::from_str::<Response>(&text) else {
                    continue;
                };
                dispatch_response(&read_shared, response).await;
            }
            // Socket closed: every live handle sees a connection-lost error.
            let mut pending = read_shared.pending.lock().await;
            for (_, entry) in pending.drain() {
                match entry {
                    Pending::OneShot(_) => {}
                    Pending::Subscription(dispatcher) => {
                        dispatcher.signal_error(CoreError::Other("connection lost".to_string()));
                    }
                }
            }
        });

        Ok(DpmConnection { sink: Mutex::new(sink), shared, next_id: AtomicU64::new(1) })
    }

    pub fn next_correlation_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Send `request` and await exactly one correlated response.
    pub async fn call(&self, request: Request) -> Result<Response> {
        let id = request.correlation_id();
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.shared.pending.lock().await;
            pending.insert(id, Pending::OneShot(tx));
        }
        self.send(request).await?;
        rx.await.map_err(|_| CoreError::Other("dpm connection closed before reply".to_string()))
    }

    /// Register a standing subscription under `correlation_id`, so every
    /// future `Reading`-tagged response carrying it is routed to
    /// `dispatcher` instead of a one-shot waiter.
    pub async fn register_subscription(&self, correlation_id: u64, dispatcher: SubscriptionDispatcher) {
        let mut pending = self.shared.pending.lock().await;
        pending.insert(correlation_id, Pending::Subscription(dispatcher));
    }

    pub async fn unregister(&self, correlation_id: u64) {
        let mut pending = self.shared.pending.lock().await;
        pending.remove(&correlation_id);
    }

    pub async fn send(&self, request: Request) -> Result<()> {
        let text = serde_json::to_string(&request).map_err(|e| CoreError::Other(e.to_string()))?;
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text))
            .await
            .map_err(|e| CoreError::Other(format!("dpm send failed: {e}")))
    }
}

async fn dispatch_response(shared: &Shared, response: Response) {
    let id = match &response {
        Response::Reading { correlation_id, .. } => *correlation_id,
        Response::ReadingBatch { correlation_id, .. } => *correlation_id,
        Response::WriteResult { correlation_id, .. } => *correlation_id,
    };
    let mut pending = shared.pending.lock().await;
    match pending.get(&id) {
        Some(Pending::Subscription(dispatcher)) => {
            if let Response::Reading { drf, facility, error_code, message, value, .. } = response {
                let now = chrono::Local::now();
                let reading = match value {
                    Some(v) if error_code == 0 => Reading::ok(drf, v, now),
                    _ => Reading::error(drf, facility, error_code, message.unwrap_or_default(), now),
                };
                dispatcher.dispatch(reading);
            }
        }
        Some(Pending::OneShot(_)) => {
            if let Some(Pending::OneShot(tx)) = pending.remove(&id) {
                let _ = tx.send(response);
            }
        }
        None => {}
    }
}
