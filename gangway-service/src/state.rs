use crate::keys::KeyStore;
use std::sync::Arc;
use tokio::sync::broadcast;

pub type SharedState = Arc<AppState>;

/// Fan-out capacity before slow event clients start losing frames.
const EVENT_BUFFER: usize = 64;

pub struct AppState {
    pub keys: KeyStore,
    /// Serialized envelopes pushed to every connected event client.
    pub events: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(keys: KeyStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { keys, events }
    }
}
