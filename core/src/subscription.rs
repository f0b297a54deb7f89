// Poisoned mutex should fail the program.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use tracing::warn;

use crate::errors::CoreError;
use crate::errors::Result;
use crate::reading::Reading;

const DROP_WARNING_WINDOW: Duration = Duration::from_secs(5);
/// Polling granularity for the sync handle's timed `readings()` — the
/// handle has no runtime to hang a timer off of, so it polls the channel
/// at this cadence while the wall-clock budget remains.
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Whether a subscription delivers through pull-style iteration or
/// push-style callback. The two are mutually exclusive on one handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMode {
    Iterator,
    Callback,
}

#[derive(Debug)]
struct SharedState {
    stopped: bool,
    error: Option<Arc<CoreError>>,
    dropped: u64,
    last_drop_warning: Option<Instant>,
    ref_ids: Vec<String>,
}

/// The producer side of a subscription: held by the backend that pushes
/// readings as they arrive off the wire.
#[derive(Clone)]
pub struct SubscriptionDispatcher {
    tx: async_channel::Sender<Reading>,
    state: Arc<Mutex<SharedState>>,
}

impl SubscriptionDispatcher {
    /// Push a reading to the consumer. A silent no-op once the handle has
    /// been stopped. When the bounded buffer is full, the newest reading is
    /// dropped and the drop counter is incremented; a warning is logged at
    /// most once per 5-second window.
    pub fn dispatch(&self, reading: Reading) {
        let mut state = self.state.lock().expect("subscription state poisoned");
        if state.stopped {
            return;
        }
        drop(state);
        if let Err(async_channel::TrySendError::Full(_)) = self.tx.try_send(reading) {
            let mut state = self.state.lock().expect("subscription state poisoned");
            state.dropped += 1;
            let should_warn = state
                .last_drop_warning
                .map(|t| t.elapsed() >= DROP_WARNING_WINDOW)
                .unwrap_or(true);
            if should_warn {
                state.last_drop_warning = Some(Instant::now());
                let dropped = state.dropped;
                drop(state);
                warn!(dropped, "subscription buffer full, dropping newest reading");
            }
        }
    }

    /// Latch the first error. Later calls are discarded.
    pub fn signal_error(&self, err: CoreError) {
        let mut state = self.state.lock().expect("subscription state poisoned");
        if state.error.is_none() {
            state.error = Some(Arc::new(err));
        }
        state.stopped = true;
    }

    /// Mark the subscription stopped with no error. Idempotent.
    pub fn signal_stop(&self) {
        let mut state = self.state.lock().expect("subscription state poisoned");
        state.stopped = true;
    }
}

fn new_pair(
    capacity: usize,
    ref_ids: Vec<String>,
    mode: SubscriptionMode,
) -> (SubscriptionDispatcher, async_channel::Receiver<Reading>, Arc<Mutex<SharedState>>, SubscriptionMode) {
    let (tx, rx) = async_channel::bounded(capacity.max(1));
    let state = Arc::new(Mutex::new(SharedState {
        stopped: false,
        error: None,
        dropped: 0,
        last_drop_warning: None,
        ref_ids,
    }));
    (SubscriptionDispatcher { tx, state: state.clone() }, rx, state, mode)
}

/// The sync, pull-style consumer side of a subscription.
pub struct SubscriptionHandle {
    rx: async_channel::Receiver<Reading>,
    state: Arc<Mutex<SharedState>>,
    mode: SubscriptionMode,
}

/// Build a dispatcher/handle pair sharing a bounded buffer of `capacity`
/// readings.
pub fn subscription_channel(
    capacity: usize,
    ref_ids: Vec<String>,
    mode: SubscriptionMode,
) -> (SubscriptionDispatcher, SubscriptionHandle) {
    let (dispatcher, rx, state, mode) = new_pair(capacity, ref_ids, mode);
    (dispatcher, SubscriptionHandle { rx, state, mode })
}

impl SubscriptionHandle {
    /// Drain buffered readings. `timeout = None` blocks until at least one
    /// reading or a terminal signal arrives; `Some(ZERO)` never blocks;
    /// `Some(d)` budgets at most `d` of wall-clock time. Always drains
    /// everything currently buffered before surfacing a latched error.
    pub fn readings(&self, timeout: Option<Duration>) -> Result<Vec<Reading>> {
        if self.mode == SubscriptionMode::Callback {
            return Err(CoreError::CallbackModeMismatch);
        }
        let mut out = Vec::new();
        match timeout {
            None => {
                if let Ok(first) = self.rx.recv_blocking() {
                    out.push(first);
                }
                while let Ok(r) = self.rx.try_recv() {
                    out.push(r);
                }
            }
            Some(d) if d.is_zero() => {
                while let Ok(r) = self.rx.try_recv() {
                    out.push(r);
                }
            }
            Some(d) => {
                let deadline = Instant::now() + d;
                loop {
                    match self.rx.try_recv() {
                        Ok(r) => {
                            out.push(r);
                            continue;
                        }
                        Err(async_channel::TryRecvError::Closed) => break,
                        Err(async_channel::TryRecvError::Empty) => {}
                    }
                    if Instant::now() >= deadline {
                        break;
                    }
                    std::thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
                }
            }
        }
        if out.is_empty() {
            self.raise_if_errored()?;
        }
        Ok(out)
    }

    fn raise_if_errored(&self) -> Result<()> {
        let state = self.state.lock().expect("subscription state poisoned");
        if let Some(err) = &state.error {
            return Err(CoreError::Other(err.to_string()));
        }
        Ok(())
    }

    pub fn stopped(&self) -> bool {
        self.state.lock().expect("subscription state poisoned").stopped
    }

    pub fn dropped_count(&self) -> u64 {
        self.state.lock().expect("subscription state poisoned").dropped
    }

    /// A defensive copy of the ref-id list passed at construction.
    pub fn ref_ids(&self) -> Vec<String> {
        self.state.lock().expect("subscription state poisoned").ref_ids.clone()
    }
}

/// The cooperative, pull-style consumer side of a subscription.
pub struct AsyncSubscriptionHandle {
    rx: async_channel::Receiver<Reading>,
    state: Arc<Mutex<SharedState>>,
    mode: SubscriptionMode,
}

pub fn async_subscription_channel(
    capacity: usize,
    ref_ids: Vec<String>,
    mode: SubscriptionMode,
) -> (SubscriptionDispatcher, AsyncSubscriptionHandle) {
    let (dispatcher, rx, state, mode) = new_pair(capacity, ref_ids, mode);
    (dispatcher, AsyncSubscriptionHandle { rx, state, mode })
}

impl AsyncSubscriptionHandle {
    pub async fn readings(&self, timeout: Option<Duration>) -> Result<Vec<Reading>> {
        if self.mode == SubscriptionMode::Callback {
            return Err(CoreError::CallbackModeMismatch);
        }
        let mut out = Vec::new();
        match timeout {
            None => {
                if let Ok(first) = self.rx.recv().await {
                    out.push(first);
                }
                while let Ok(r) = self.rx.try_recv() {
                    out.push(r);
                }
            }
            Some(d) if d.is_zero() => {
                while let Ok(r) = self.rx.try_recv() {
                    out.push(r);
                }
            }
            Some(d) => {
                if let Ok(Ok(first)) = tokio::time::timeout(d, self.rx.recv()).await {
                    out.push(first);
                }
                while let Ok(r) = self.rx.try_recv() {
                    out.push(r);
                }
            }
        }
        if out.is_empty() {
            let state = self.state.lock().expect("subscription state poisoned");
            if let Some(err) = &state.error {
                return Err(CoreError::Other(err.to_string()));
            }
        }
        Ok(out)
    }

    pub fn stopped(&self) -> bool {
        self.state.lock().expect("subscription state poisoned").stopped
    }

    pub fn ref_ids(&self) -> Vec<String> {
        self.state.lock().expect("subscription state poisoned").ref_ids.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::value::Value;
    use chrono::Local;

    fn reading(drf: &str) -> Reading {
        Reading::ok(drf, Value::Scalar(1.0), Local::now())
    }

    #[test]
    fn delivers_in_order() {
        let (dispatcher, handle) = subscription_channel(8, vec![], SubscriptionMode::Iterator);
        dispatcher.dispatch(reading("A"));
        dispatcher.dispatch(reading("B"));
        dispatcher.signal_stop();
        let got = handle.readings(Some(Duration::ZERO)).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].drf, "A");
        assert_eq!(got[1].drf, "B");
        assert!(handle.stopped());
    }

    #[test]
    fn drops_when_full_and_counts() {
        let (dispatcher, handle) = subscription_channel(1, vec![], SubscriptionMode::Iterator);
        dispatcher.dispatch(reading("A"));
        dispatcher.dispatch(reading("B"));
        assert_eq!(handle.dropped_count(), 1);
        let got = handle.readings(Some(Duration::ZERO)).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].drf, "A");
    }

    #[test]
    fn dispatch_after_stop_is_noop() {
        let (dispatcher, handle) = subscription_channel(8, vec![], SubscriptionMode::Iterator);
        dispatcher.signal_stop();
        dispatcher.dispatch(reading("A"));
        let got = handle.readings(Some(Duration::ZERO)).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn callback_mode_rejects_readings() {
        let (_dispatcher, handle) = subscription_channel(8, vec![], SubscriptionMode::Callback);
        assert!(matches!(handle.readings(Some(Duration::ZERO)), Err(CoreError::CallbackModeMismatch)));
    }

    #[test]
    fn ref_ids_is_defensive_copy() {
        let (_dispatcher, handle) = subscription_channel(8, vec!["id1".into()], SubscriptionMode::Iterator);
        let mut ids = handle.ref_ids();
        ids.push("id2".into());
        assert_eq!(handle.ref_ids(), vec!["id1".to_string()]);
    }
}
