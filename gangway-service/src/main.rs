mod error;
mod events;
mod keys;
mod routes;
mod state;

use axum::routing::{get, post};
use axum::Router;
use keys::KeyStore;
use state::{AppState, SharedState};
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

fn arg_value(flag: &str) -> Option<String> {
    std::env::args()
        .position(|a| a == flag)
        .and_then(|i| std::env::args().nth(i + 1))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gangway_service=info,tower_http=info".into()),
        )
        .init();

    let port: u16 = arg_value("--port")
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    let events_port: u16 = arg_value("--events-port")
        .and_then(|p| p.parse().ok())
        .unwrap_or(3002);
    let bind = arg_value("--bind").unwrap_or_else(|| "127.0.0.1".to_string());
    let db = arg_value("--db").unwrap_or_else(|| "gangway.db".to_string());

    let keys = if db == ":memory:" {
        KeyStore::open_in_memory()
    } else {
        KeyStore::open(Path::new(&db))
    }
    .unwrap_or_else(|err| {
        eprintln!("failed to open key store at {}: {}", db, err);
        std::process::exit(1);
    });

    let state: SharedState = Arc::new(AppState::new(keys));

    let api = Router::new()
        .route("/api/app/version", get(routes::app_version))
        .route("/api/app/platform", get(routes::app_platform))
        .route("/api/api-keys/has-any", get(routes::has_any_keys))
        .route("/api/api-keys/all", get(routes::list_keys))
        .route("/api/api-keys/{provider}/exists", get(routes::key_exists))
        .route("/api/api-keys/{provider}/validate", post(routes::validate_key))
        .route(
            "/api/api-keys/{provider}",
            get(routes::get_key)
                .post(routes::store_key)
                .delete(routes::delete_key),
        )
        .route("/api/events/emit", post(routes::emit_event))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    // The event channel listens on its own port so browser clients keep one
    // URL per transport.
    let event_router = Router::new()
        .route("/", get(events::upgrade))
        .route("/ws", get(events::upgrade))
        .with_state(state);

    let api_addr = format!("{}:{}", bind, port);
    let events_addr = format!("{}:{}", bind, events_port);
    tracing::info!(%api_addr, %events_addr, "gangway-service listening");

    let api_listener = tokio::net::TcpListener::bind(&api_addr).await.unwrap();
    let events_listener = tokio::net::TcpListener::bind(&events_addr).await.unwrap();

    tokio::spawn(async move {
        axum::serve(events_listener, event_router).await.unwrap();
    });
    axum::serve(api_listener, api).await.unwrap();
}
