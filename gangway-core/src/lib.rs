//! Gangway Core - Shared bridge contract
//!
//! Renderer code talks to one capability surface regardless of where it
//! runs: inside the desktop shell (native bridge) or in a plain browser tab
//! (HTTP/WebSocket against a companion server). This crate holds the pieces
//! both sides agree on: the mode verdict, the capability trait, wire types,
//! the event channel model, and the error taxonomy.

pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod mode;
pub mod types;

pub use bridge::{Bridge, EventCallback, Subscription};
pub use config::{RemoteConfig, DEFAULT_EVENTS_URL, DEFAULT_SERVER_URL};
pub use error::{ErrorBody, GangwayError};
pub use events::{Channel, DebugEntry, Envelope, EventData, PermissionRequest, TaskEvent};
pub use mode::{detect, RuntimeMode, ShellMarker};
pub use types::{ApiKeyStatus, KeyValidation, ProviderSettings, TaskSnapshot, TaskSpec};

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, GangwayError>;
