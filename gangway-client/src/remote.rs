//! HTTP adapter for the companion server

use crate::events::{EventChannel, ReconnectPolicy};
use crate::storage::LocalStore;
use async_trait::async_trait;
use gangway_core::{
    ApiKeyStatus, Bridge, Channel, ErrorBody, EventCallback, GangwayError, KeyValidation,
    ProviderSettings, RemoteConfig, Result, Subscription, TaskSnapshot, TaskSpec,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which the onboarding flag is persisted client-side. The server
/// never sees it.
const ONBOARDING_KEY: &str = "onboarding-complete";

/// Capabilities the companion server does not offer, with the reason each
/// stub reports. One entry per operation; every call goes through
/// [`unsupported`] so the failure is byte-identical each time and callers
/// can treat "not implemented" as a stable contract.
const UNSUPPORTED: &[(&str, &str)] = &[
    ("start_task", "task execution stays in the desktop shell"),
    ("cancel_task", "task execution stays in the desktop shell"),
    ("task_snapshot", "task execution stays in the desktop shell"),
    (
        "respond_permission",
        "permission prompts require the desktop shell",
    ),
    (
        "resume_session",
        "session resumption requires the desktop shell",
    ),
    ("set_debug_mode", "debug toggling requires the desktop shell"),
    (
        "provider_settings",
        "provider configuration is not served yet",
    ),
    (
        "set_provider_settings",
        "provider configuration is not served yet",
    ),
];

fn unsupported(operation: &'static str) -> GangwayError {
    let reason = UNSUPPORTED
        .iter()
        .find(|(name, _)| *name == operation)
        .map(|(_, reason)| *reason)
        .unwrap_or("not available over HTTP");
    GangwayError::Unsupported { operation, reason }
}

fn connection_error(err: reqwest::Error) -> GangwayError {
    GangwayError::Connection(err.to_string())
}

#[derive(Deserialize)]
struct VersionResponse {
    version: String,
}

#[derive(Deserialize)]
struct PlatformResponse {
    platform: String,
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Deserialize)]
struct KeyResponse {
    key: Option<String>,
}

#[derive(Deserialize)]
struct SuccessResponse {
    #[allow(dead_code)]
    success: bool,
}

#[derive(Serialize)]
struct StoreKeyRequest<'a> {
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
}

#[derive(Serialize)]
struct ValidateKeyRequest<'a> {
    key: &'a str,
}

/// Remote-mode implementation of the capability surface.
///
/// HTTP request/response against the configured base URL plus one lazy
/// persistent event connection. Calls are independent: no request queue, no
/// de-duplication, no retries — concurrent calls may race, which is fine
/// for this low-frequency configuration surface.
pub struct RemoteBridge {
    base_url: String,
    http: reqwest::Client,
    channel: EventChannel,
    store: LocalStore,
}

impl RemoteBridge {
    pub fn new(config: RemoteConfig) -> Self {
        Self::with_store(config, LocalStore::default_location())
    }

    /// Construct with an explicit local store (tests point this at a
    /// scratch directory).
    pub fn with_store(config: RemoteConfig, store: LocalStore) -> Self {
        // Cookie store so credentials ride along on every call.
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("HTTP client construction");
        Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            http,
            channel: EventChannel::new(config.events_url, ReconnectPolicy::default()),
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(connection_error)?;
        Self::parse(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(connection_error)?;
        Self::parse(response).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .delete(self.url(path))
            .send()
            .await
            .map_err(connection_error)?;
        Self::parse(response).await
    }

    /// Non-2xx responses carry `{"error": …}`; fall back to a generic
    /// message when the body is something else.
    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("request failed with status {}", status.as_u16()));
            return Err(GangwayError::Request {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| GangwayError::Connection(format!("unexpected response body: {e}")))
    }
}

#[async_trait]
impl Bridge for RemoteBridge {
    async fn app_version(&self) -> Result<String> {
        let body: VersionResponse = self.get_json("/api/app/version").await?;
        Ok(body.version)
    }

    async fn platform(&self) -> Result<String> {
        let body: PlatformResponse = self.get_json("/api/app/platform").await?;
        Ok(body.platform)
    }

    async fn has_any_api_key(&self) -> Result<bool> {
        let body: ExistsResponse = self.get_json("/api/api-keys/has-any").await?;
        Ok(body.exists)
    }

    async fn list_api_keys(&self) -> Result<BTreeMap<String, ApiKeyStatus>> {
        self.get_json("/api/api-keys/all").await
    }

    async fn api_key_exists(&self, provider: &str) -> Result<bool> {
        let body: ExistsResponse = self
            .get_json(&format!("/api/api-keys/{provider}/exists"))
            .await?;
        Ok(body.exists)
    }

    async fn get_api_key(&self, provider: &str) -> Result<Option<String>> {
        let body: KeyResponse = self.get_json(&format!("/api/api-keys/{provider}")).await?;
        Ok(body.key)
    }

    async fn set_api_key(&self, provider: &str, key: &str, label: Option<&str>) -> Result<()> {
        let _: SuccessResponse = self
            .post_json(
                &format!("/api/api-keys/{provider}"),
                &StoreKeyRequest { key, label },
            )
            .await?;
        Ok(())
    }

    async fn delete_api_key(&self, provider: &str) -> Result<()> {
        let _: SuccessResponse = self
            .delete_json(&format!("/api/api-keys/{provider}"))
            .await?;
        Ok(())
    }

    async fn validate_api_key(&self, provider: &str, key: &str) -> Result<KeyValidation> {
        self.post_json(
            &format!("/api/api-keys/{provider}/validate"),
            &ValidateKeyRequest { key },
        )
        .await
    }

    async fn start_task(&self, _spec: TaskSpec) -> Result<String> {
        Err(unsupported("start_task"))
    }

    async fn cancel_task(&self, _task_id: &str) -> Result<()> {
        Err(unsupported("cancel_task"))
    }

    async fn task_snapshot(&self, _task_id: &str) -> Result<TaskSnapshot> {
        Err(unsupported("task_snapshot"))
    }

    async fn respond_permission(&self, _request_id: &str, _allow: bool) -> Result<()> {
        Err(unsupported("respond_permission"))
    }

    async fn resume_session(&self, _session_id: &str) -> Result<()> {
        Err(unsupported("resume_session"))
    }

    async fn set_debug_mode(&self, _enabled: bool) -> Result<()> {
        Err(unsupported("set_debug_mode"))
    }

    async fn provider_settings(&self, _provider: &str) -> Result<ProviderSettings> {
        Err(unsupported("provider_settings"))
    }

    async fn set_provider_settings(
        &self,
        _provider: &str,
        _settings: ProviderSettings,
    ) -> Result<()> {
        Err(unsupported("set_provider_settings"))
    }

    async fn onboarding_complete(&self) -> Result<bool> {
        Ok(self.store.get(ONBOARDING_KEY)?.as_deref() == Some("true"))
    }

    async fn set_onboarding_complete(&self, complete: bool) -> Result<()> {
        if complete {
            self.store.set(ONBOARDING_KEY, "true")
        } else {
            self.store.remove(ONBOARDING_KEY)
        }
    }

    fn subscribe(&self, channel: Channel, callback: EventCallback) -> Result<Subscription> {
        Ok(self.channel.subscribe(channel, callback))
    }
}
