//! Event channel integration: a real WebSocket server feeds the channel,
//! drops the connection, and comes back. Subscribers must not notice.

use futures_util::SinkExt;
use gangway_client::{ChannelState, EventChannel, ReconnectPolicy};
use gangway_core::{Channel, EventData};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

fn short_policy() -> ReconnectPolicy {
    ReconnectPolicy {
        delay: Duration::from_millis(25),
    }
}

fn debug_frame(message: &str) -> Message {
    Message::text(format!(
        r#"{{"channel":"debug-log","data":{{"level":"info","message":"{message}"}}}}"#
    ))
}

fn recording_subscriber() -> (
    Arc<dyn Fn(EventData) + Send + Sync>,
    Arc<Mutex<Vec<String>>>,
) {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: Arc<dyn Fn(EventData) + Send + Sync> = Arc::new(move |event| {
        if let EventData::Debug(entry) = event {
            sink.lock().unwrap().push(entry.message);
        }
    });
    (callback, seen)
}

async fn wait_for(cond: impl Fn() -> bool, timeout: Duration) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn connection_opens_lazily_on_first_subscription() {
    let (listener, url) = bind().await;
    let channel = EventChannel::new(url, short_policy());
    assert_eq!(channel.state(), ChannelState::Closed);

    // No subscription yet: nothing should dial in.
    let early = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
    assert!(early.is_err(), "channel connected before any subscription");

    let _subscription = channel.subscribe(Channel::Debug, Arc::new(|_| {}));
    let accepted = tokio::time::timeout(Duration::from_secs(2), listener.accept()).await;
    assert!(
        accepted.is_ok(),
        "channel did not connect after first subscription"
    );
}

#[tokio::test]
async fn subscribers_survive_a_dropped_connection() {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        // First connection: one frame, then drop without a close handshake.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(debug_frame("before-drop")).await.unwrap();
        drop(ws);

        // The channel reconnects on its own; serve the second connection.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(debug_frame("after-reconnect")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let channel = EventChannel::new(url, short_policy());
    let (callback, seen) = recording_subscriber();
    let _subscription = channel.subscribe(Channel::Debug, callback);

    let delivered = Arc::clone(&seen);
    assert!(
        wait_for(
            move || delivered.lock().unwrap().len() == 2,
            Duration::from_secs(5)
        )
        .await,
        "did not receive both frames across the reconnect"
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["before-drop".to_string(), "after-reconnect".to_string()]
    );
}

#[tokio::test]
async fn malformed_wire_frames_are_skipped() {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::text("garbage")).await.unwrap();
        ws.send(Message::text(r#"{"channel":"mystery","data":{}}"#))
            .await
            .unwrap();
        ws.send(debug_frame("good")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let channel = EventChannel::new(url, short_policy());
    let (callback, seen) = recording_subscriber();
    let _subscription = channel.subscribe(Channel::Debug, callback);

    let delivered = Arc::clone(&seen);
    assert!(
        wait_for(
            move || !delivered.lock().unwrap().is_empty(),
            Duration::from_secs(5)
        )
        .await
    );
    // Only the well-formed frame made it through.
    assert_eq!(*seen.lock().unwrap(), vec!["good".to_string()]);
}

#[tokio::test]
async fn unsubscribed_callback_never_fires() {
    let (listener, url) = bind().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(debug_frame("only-for-the-attached")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let channel = EventChannel::new(url, short_policy());
    let (cancelled_cb, cancelled_seen) = recording_subscriber();
    let (kept_cb, kept_seen) = recording_subscriber();

    // Subscribe and cancel before yielding to the reader task; cancellation
    // is synchronous, so the callback must never run.
    let subscription = channel.subscribe(Channel::Debug, cancelled_cb);
    subscription.unsubscribe();
    let _kept = channel.subscribe(Channel::Debug, kept_cb);

    let delivered = Arc::clone(&kept_seen);
    assert!(
        wait_for(
            move || !delivered.lock().unwrap().is_empty(),
            Duration::from_secs(5)
        )
        .await
    );
    assert!(cancelled_seen.lock().unwrap().is_empty());
}
