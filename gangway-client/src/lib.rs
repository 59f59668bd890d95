//! Gangway Client - Transport facade for renderer code
//!
//! [`connect`] owns mode selection: callers get one capability surface and
//! never branch on where they run. Native mode hands back the bridge the
//! desktop shell installed; remote mode builds an HTTP adapter plus a
//! persistent event channel against the companion server.

pub mod events;
pub mod remote;
pub mod runtime;
pub mod storage;

pub use events::{ChannelState, EventChannel, ReconnectPolicy};
pub use remote::RemoteBridge;
pub use runtime::{connect, HostEnv};
pub use storage::LocalStore;
