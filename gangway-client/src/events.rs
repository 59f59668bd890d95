//! Persistent event channel with automatic reconnect
//!
//! One WebSocket per facade, opened lazily on the first subscription and
//! kept for the facade's lifetime. The connection cycles
//! `Closed → Connecting → Open → Closed → (delay) → Connecting` forever;
//! there is no terminal state short of process exit. Subscribers never
//! observe the cycle: registrations survive reconnects, with no replay and
//! no gap detection.

use futures_util::StreamExt;
use gangway_core::{Channel, EventCallback, EventData, GangwayError, Subscription};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// How long to wait between connection attempts.
///
/// Fixed delay, no backoff, no attempt cap: a local-development companion
/// server is expected to come back, and the channel keeps trying until the
/// process exits. Injectable so tests can run the cycle without real
/// one-second waits.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
}

type Registry = HashMap<Channel, Vec<(u64, EventCallback)>>;

struct ChannelInner {
    url: String,
    policy: ReconnectPolicy,
    registry: Mutex<Registry>,
    state: Mutex<ChannelState>,
    next_id: AtomicU64,
    started: Mutex<bool>,
}

impl ChannelInner {
    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ChannelState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// The single event connection shared by all of a facade's subscriptions.
pub struct EventChannel {
    inner: Arc<ChannelInner>,
}

impl EventChannel {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                url: url.into(),
                policy,
                registry: Mutex::new(HashMap::new()),
                state: Mutex::new(ChannelState::Closed),
                next_id: AtomicU64::new(0),
                started: Mutex::new(false),
            }),
        }
    }

    pub fn state(&self) -> ChannelState {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `callback` for `channel` and make sure the connection loop
    /// is running. Must be called from within a tokio runtime.
    ///
    /// The returned handle removes exactly this callback; it never closes
    /// the connection, which other subscribers may still be using.
    pub fn subscribe(&self, channel: Channel, callback: EventCallback) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .lock_registry()
            .entry(channel)
            .or_default()
            .push((id, callback));
        self.ensure_running();

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                if let Some(subscribers) = inner.lock_registry().get_mut(&channel) {
                    subscribers.retain(|(subscriber_id, _)| *subscriber_id != id);
                }
            }
        })
    }

    /// Spawn the connection loop on first use.
    fn ensure_running(&self) {
        let mut started = self
            .inner
            .started
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *started {
            return;
        }
        *started = true;
        tokio::spawn(run(Arc::clone(&self.inner)));
    }
}

async fn run(inner: Arc<ChannelInner>) {
    loop {
        inner.set_state(ChannelState::Connecting);
        match connect_async(inner.url.as_str()).await {
            Ok((stream, _)) => {
                inner.set_state(ChannelState::Open);
                tracing::debug!(url = %inner.url, "event channel connected");
                let (_write, mut read) = stream.split();
                while let Some(frame) = read.next().await {
                    match frame {
                        Ok(Message::Text(text)) => dispatch(&inner, text.as_str()),
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {} // ping/pong/binary, nothing to dispatch
                        Err(err) => {
                            tracing::warn!(error = %err, "event channel read failed");
                            break;
                        }
                    }
                }
            }
            Err(err) => {
                tracing::debug!(url = %inner.url, error = %err, "event channel connect failed");
            }
        }
        inner.set_state(ChannelState::Closed);
        tokio::time::sleep(inner.policy.delay).await;
    }
}

/// Decode one frame and fan it out to the matching channel's callbacks in
/// subscription order. Malformed frames and unknown channels are logged and
/// dropped; they never reach subscribers and never tear down the channel.
fn dispatch(inner: &ChannelInner, text: &str) {
    let event = match EventData::from_frame(text) {
        Ok(event) => event,
        Err(GangwayError::UnknownChannel(name)) => {
            tracing::warn!(channel = %name, "dropping event for unknown channel");
            return;
        }
        Err(err) => {
            tracing::warn!(error = %err, "dropping malformed event frame");
            return;
        }
    };

    // Snapshot under the lock so an unsubscribe that already completed is
    // guaranteed not to be called; invoke outside it so callbacks may
    // subscribe or unsubscribe without deadlocking.
    let callbacks: Vec<EventCallback> = {
        let registry = inner.lock_registry();
        registry
            .get(&event.channel())
            .map(|subscribers| {
                subscribers
                    .iter()
                    .map(|(_, callback)| Arc::clone(callback))
                    .collect()
            })
            .unwrap_or_default()
    };

    for callback in callbacks {
        callback(event.clone());
    }
}
