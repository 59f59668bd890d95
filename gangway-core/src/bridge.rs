//! The capability surface both runtime modes implement

use crate::events::{Channel, EventData};
use crate::types::{ApiKeyStatus, KeyValidation, ProviderSettings, TaskSnapshot, TaskSpec};
use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Callback invoked for every decoded event on a subscribed channel.
pub type EventCallback = Arc<dyn Fn(EventData) + Send + Sync>;

/// Cancellation handle returned by [`Bridge::subscribe`].
///
/// Dropping the handle without calling [`Subscription::unsubscribe`] leaves
/// the subscription alive; its lifetime is caller-controlled, not tied to
/// any request.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove this callback from its channel, synchronously and
    /// immediately. Does not close the underlying connection; other
    /// subscribers keep receiving.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// The fixed set of operations available to renderer code.
///
/// Identical from the caller's perspective in both runtime modes; what
/// differs is only whether calls hit the shell directly or go over the
/// wire. Operations the companion server does not implement fail with a
/// stable `Unsupported` error in remote mode.
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn app_version(&self) -> Result<String>;
    async fn platform(&self) -> Result<String>;

    async fn has_any_api_key(&self) -> Result<bool>;
    async fn list_api_keys(&self) -> Result<BTreeMap<String, ApiKeyStatus>>;
    async fn api_key_exists(&self, provider: &str) -> Result<bool>;
    async fn get_api_key(&self, provider: &str) -> Result<Option<String>>;
    async fn set_api_key(&self, provider: &str, key: &str, label: Option<&str>) -> Result<()>;
    async fn delete_api_key(&self, provider: &str) -> Result<()>;

    /// Format-only check; never contacts the provider. The returned
    /// [`KeyValidation::warning`] says so and is always present.
    async fn validate_api_key(&self, provider: &str, key: &str) -> Result<KeyValidation>;

    async fn start_task(&self, spec: TaskSpec) -> Result<String>;
    async fn cancel_task(&self, task_id: &str) -> Result<()>;
    async fn task_snapshot(&self, task_id: &str) -> Result<TaskSnapshot>;

    async fn respond_permission(&self, request_id: &str, allow: bool) -> Result<()>;
    async fn resume_session(&self, session_id: &str) -> Result<()>;
    async fn set_debug_mode(&self, enabled: bool) -> Result<()>;

    async fn provider_settings(&self, provider: &str) -> Result<ProviderSettings>;
    async fn set_provider_settings(
        &self,
        provider: &str,
        settings: ProviderSettings,
    ) -> Result<()>;

    async fn onboarding_complete(&self) -> Result<bool>;
    async fn set_onboarding_complete(&self, complete: bool) -> Result<()>;

    /// Register `callback` for `channel`. Registration is synchronous; the
    /// transport behind it may connect lazily on first use.
    fn subscribe(&self, channel: Channel, callback: EventCallback) -> Result<Subscription>;
}
